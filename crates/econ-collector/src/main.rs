//! Economic parameter collector CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use econ_collector::{
    config::DEFAULT_CONFIG_PATH, sources, CollectorConfig, CollectorRegistry, Orchestrator,
    RefreshSummary, Scheduler,
};
use econ_core::{init_logging, LogConfig, LogFormat};
use econ_data::{BackupService, DataStorage, DatabaseConfig, MemoryStorage, PgStorage, SnapshotBackup};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "econ-collector")]
#[command(about = "Economic parameter collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(clap::Args)]
struct Window {
    /// 시작일 (YYYY-MM-DD, 기본: 종료일 - lookback_days)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// 종료일 (YYYY-MM-DD, 기본: 오늘)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// 지역 코드 (쉼표로 구분, 기본: 설정의 metro_geographies)
    #[arg(long, value_delimiter = ',')]
    geographies: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 수집 계획 출력 (실행하지 않음)
    Plan(Window),

    /// 계획 생성 후 바로 수집 (백업 없음)
    Collect(Window),

    /// 전체 갱신 (백업 → 계획 → 실행)
    Refresh(Window),

    /// 파라미터 하나를 즉시 갱신
    Update {
        /// 파라미터 이름 (예: treasury_10y)
        parameter: String,
    },

    /// 모든 규칙을 즉시 갱신
    UpdateAll,

    /// 수집기/저장소/스케줄러 상태
    Status,

    /// 데이터 신선도 리포트
    Freshness,

    /// 스케줄 규칙 관리
    Rules {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// 데몬 모드: 스케줄러 루프 실행 (Ctrl+C로 종료)
    Daemon,
}

#[derive(Subcommand)]
enum RuleAction {
    /// 규칙 목록
    List,
    /// 규칙 활성화
    Enable { parameter: String },
    /// 규칙 비활성화
    Disable { parameter: String },
    /// 규칙 삭제
    Remove { parameter: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // debug/trace에서는 파일 위치까지 출력
    let verbose = matches!(cli.log_level.as_str(), "debug" | "trace");
    init_logging(
        LogConfig::new(format!("econ_collector={}", cli.log_level))
            .with_format(cli.log_format)
            .with_file(verbose),
    )
    .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let config = CollectorConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;
    tracing::debug!(path = %cli.config.display(), "설정 로드 완료");

    let storage = connect_storage(&config).await?;
    let backup: Arc<dyn BackupService> = Arc::new(SnapshotBackup::new(
        Arc::clone(&storage),
        config.storage.backup_dir.clone(),
    ));

    let registry = Arc::new(CollectorRegistry::new());
    sources::register_builtin_collectors(&registry, &config.fred)?;

    let orchestrator = Arc::new(
        Orchestrator::new(registry, Arc::clone(&storage), Some(backup))
            .with_default_workers(config.orchestrator.default_max_workers)
            .with_refresh_workers(config.orchestrator.refresh_max_workers),
    );

    match cli.command {
        Commands::Plan(window) => {
            let (start, end, geographies) = window.resolve(&config)?;
            let plan = orchestrator.get_collection_plan(start, end, &geographies);
            print_json(&plan)?;
        }
        Commands::Collect(window) => {
            let (start, end, geographies) = window.resolve(&config)?;
            let results = orchestrator.collect(start, end, &geographies).await;
            print_json(&RefreshSummary::from_results(&results, Vec::new()))?;
        }
        Commands::Refresh(window) => {
            let (start, end, geographies) = window.resolve(&config)?;
            let summary = orchestrator
                .replace_all_mock_data(start, end, &geographies)
                .await;
            print_json(&summary)?;
        }
        Commands::Update { parameter } => {
            let scheduler = bootstrap_scheduler(&orchestrator, &config).await?;
            let outcome = scheduler.execute_immediate_update(&parameter).await?;
            print_json(&outcome)?;
        }
        Commands::UpdateAll => {
            let scheduler = bootstrap_scheduler(&orchestrator, &config).await?;
            let outcomes = scheduler.execute_all_updates().await;
            print_json(&outcomes)?;
        }
        Commands::Status => {
            let scheduler = bootstrap_scheduler(&orchestrator, &config).await?;

            #[derive(Serialize)]
            struct Status {
                storage: String,
                data: econ_collector::DataStatusReport,
                scheduler: econ_collector::SchedulerStatus,
            }

            print_json(&Status {
                storage: storage.name().to_string(),
                data: orchestrator.get_data_status_report().await,
                scheduler: scheduler.get_scheduler_status().await,
            })?;
        }
        Commands::Freshness => {
            let scheduler = bootstrap_scheduler(&orchestrator, &config).await?;
            print_json(&scheduler.get_data_freshness_report().await)?;
        }
        Commands::Rules { action } => {
            let scheduler = bootstrap_scheduler(&orchestrator, &config).await?;
            match action {
                RuleAction::List => print_json(&scheduler.rules().await)?,
                RuleAction::Enable { parameter } => scheduler.enable_rule(&parameter).await?,
                RuleAction::Disable { parameter } => scheduler.disable_rule(&parameter).await?,
                RuleAction::Remove { parameter } => {
                    print_json(&scheduler.remove_rule(&parameter).await?)?
                }
            }
        }
        Commands::Daemon => {
            let scheduler = bootstrap_scheduler(&orchestrator, &config).await?;
            tracing::info!(
                "=== 데몬 모드 시작 (점검 주기: {}초) ===",
                config.scheduler.poll_interval_secs
            );

            scheduler.start();
            tokio::signal::ctrl_c()
                .await
                .context("종료 신호 대기 실패")?;

            tracing::info!("종료 신호 수신, 데몬 종료 중...");
            scheduler.stop().await;
        }
    }

    tracing::info!("Econ Collector 종료");
    Ok(())
}

impl Window {
    fn resolve(self, config: &CollectorConfig) -> anyhow::Result<(NaiveDate, NaiveDate, Vec<String>)> {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = match self.start {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(config.scheduler.lookback_days))
                .context("조회 기간 계산 실패")?,
        };
        anyhow::ensure!(start <= end, "시작일({})이 종료일({})보다 늦습니다", start, end);

        let geographies = if self.geographies.is_empty() {
            config.scheduler.metro_geographies.clone()
        } else {
            self.geographies
        };
        Ok((start, end, geographies))
    }
}

/// 설정에 DB URL이 있으면 PostgreSQL, 없으면 인메모리 저장소.
async fn connect_storage(config: &CollectorConfig) -> anyhow::Result<Arc<dyn DataStorage>> {
    match &config.storage.database_url {
        Some(url) => {
            let db_config = DatabaseConfig {
                max_connections: config.storage.max_connections,
                ..DatabaseConfig::new(url.as_str())
            };
            let storage = PgStorage::connect(&db_config).await?;
            storage.ensure_schema().await?;
            Ok(Arc::new(storage))
        }
        None => {
            tracing::warn!("DATABASE_URL 없음, 인메모리 저장소 사용 (프로세스 종료 시 데이터 유실)");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

async fn bootstrap_scheduler(
    orchestrator: &Arc<Orchestrator>,
    config: &CollectorConfig,
) -> anyhow::Result<Scheduler> {
    Ok(Scheduler::bootstrap(Arc::clone(orchestrator), config.scheduler.clone()).await?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
