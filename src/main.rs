use anyhow::Context;
use clap::Parser;
use polla_pool::domain::ports::Backend;
use polla_pool::utils::{logger, validation::Validate};
use polla_pool::{BackendConfig, CliConfig, GameMode, MemoryStore, PoolEngine, PrizeResult, RestStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting polla-pool");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(3);
    }

    let mode: GameMode = config
        .game
        .parse()
        .context("invalid --game value")?;

    if config.offline {
        let engine = PoolEngine::new(Arc::new(MemoryStore::new()), mode);
        return run_session(engine, mode).await;
    }

    // CLI flags win over the config file; the file is only required when
    // the flags are not given.
    let (url, api_key, bulk_concurrency) = match (&config.backend_url, &config.api_key) {
        (Some(url), Some(api_key)) => (url.clone(), api_key.clone(), None),
        _ => {
            let file = BackendConfig::from_file(&config.config_file).map_err(|e| {
                tracing::error!("Cannot load backend settings: {}", e);
                anyhow::anyhow!(e)
            })?;
            (
                file.backend.url.clone(),
                file.backend.api_key.clone(),
                file.bulk_concurrency(),
            )
        }
    };

    let store = match RestStore::new(&url, &api_key) {
        Ok(store) => store,
        Err(e) => {
            // A backend client that cannot initialize ends the session.
            tracing::error!("Backend client initialization failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(3);
        }
    };

    let mut engine = PoolEngine::new(Arc::new(store), mode);
    if let Some(limit) = bulk_concurrency {
        engine = engine.with_bulk_concurrency(limit);
    }
    run_session(engine, mode).await
}

async fn run_session<S: Backend + 'static>(
    mut engine: PoolEngine<S>,
    mode: GameMode,
) -> anyhow::Result<()> {
    let result = match engine.load().await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Failed to load {} state: {}", mode, e);
            eprintln!("❌ {}", e);
            std::process::exit(if e.is_fatal() { 3 } else { 1 });
        }
    };

    print_summary(mode, &engine, &result);
    engine.shutdown().await;
    Ok(())
}

fn print_summary<S>(mode: GameMode, engine: &PoolEngine<S>, result: &PrizeResult) {
    println!("── {} ──────────────────────────────", mode);
    println!("Jugadas:            {}", result.complete_count);
    println!("  de ellas gratis:  {}", result.free_play_count);
    println!("Recaudado:          {}", result.gross_revenue);
    println!("Aporte a premio:    {}", result.prize_contribution);
    println!("Ganancia casa:      {}", result.house_cut);
    println!("Pote diario:        {}", result.daily_pot);
    println!("Pote semanal:       {}", result.weekly_pot);
    println!("Garantizado:        {}", engine.state.config.guaranteed_minimum);
    println!("Acumulado:          {}", engine.state.config.accumulated_carry);
    println!("Números ganadores:  {}", engine.state.winning_numbers.to_vec().join(" "));
    println!("Pozo total:         {}", result.total_pot);
    println!("Ganadores:          {}", result.winners.len());
    for winner in &result.winners {
        println!("  #{:<3} {}", winner.id, winner.player_name);
    }
    println!("Premio por ganador: {}", result.amount_per_winner);
}
