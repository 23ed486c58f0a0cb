use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use poolbot_common::{lang::Languages, logging};
use poolbot_config::Config;
use poolbot_notify::{NotifyService, TelegramGateway};
use poolbot_registry::Registry;
use poolbot_store::Store;
use poolbot_tasks::TaskManager;
use tracing::*;

use crate::args::{AppMode, Args};

mod args;

const SHUTDOWN_GRACE_SECS: u64 = 5;

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e}");
        return Err(e);
    }

    Ok(())
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;

    // Init the task manager and logging before anything else.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("poolbot-rt")
        .build()
        .expect("init: build rt");
    let task_manager = TaskManager::new(runtime.handle().clone());
    let executor = task_manager.executor();

    init_logging(&args);

    let languages = Arc::new(
        Languages::load(&args.locales_path, &args.locales.0).context("load locales")?,
    );

    let handle = executor.handle().clone();
    let (store, registry) = handle.block_on(async {
        let store = Store::connect(&config.postgres.dsn())
            .await
            .context("connect postgres")?;
        store.run_migrations().await.context("run migrations")?;

        let registry = Registry::connect(&store, &args.certs)
            .await
            .context("connect pool backends")?;

        anyhow::Ok((store, registry))
    })?;
    let store = Arc::new(store);
    let registry = Arc::new(registry);

    let coins: Vec<_> = registry.infos().map(|info| info.coin.clone()).collect();
    info!(?coins, "init finished, starting notify service");

    let gateway = Arc::new(TelegramGateway::new(&config.bot.bot_token));
    let notify = NotifyService::new(
        store.clone(),
        registry.clone(),
        gateway,
        languages,
        &config.notify,
    );
    notify.start(&executor);

    task_manager.start_signal_listeners();
    let result = task_manager.monitor(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));

    // Ordered teardown: detector loops are gone, release the backend
    // channels, then the pool.
    drop(notify);
    match Arc::try_unwrap(registry) {
        Ok(mut registry) => {
            registry.close();
            info!("closed pool backend channels");
        }
        Err(_) => warn!("registry still referenced at shutdown"),
    }
    handle.block_on(store.close());
    info!("closed postgres pool");

    logging::finalize();
    result
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = toml::from_str::<Config>(&raw).context("parse config")?;
    Ok(config)
}

fn init_logging(args: &Args) {
    let mut lconfig = logging::LoggerConfig::with_base_name("poolbot");
    lconfig.set_default_directive(match args.mode {
        AppMode::Dev => "debug",
        AppMode::Prod => "info",
    });
    if let Some(path) = &args.log_file {
        lconfig.set_log_file(path.clone());
    }

    logging::init(lconfig);
}
