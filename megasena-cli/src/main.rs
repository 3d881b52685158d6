use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::warn;

use megasena_cli::analysis::backtest::backtest;
use megasena_cli::analysis::closing::{closing_combinations, sample_combinations};
use megasena_cli::analysis::sampler::{generate_tickets, seeded_rng, weighted_pick_with};
use megasena_cli::analysis::statistics::{delay, frequency};
use megasena_cli::analysis::{number_stats, tag_probabilities};
use megasena_cli::config::{AppConfig, DEFAULT_CONFIG_FILE};
use megasena_cli::display::{
    display_backtest, display_closing, display_draws, display_footer, display_import_summary,
    display_probabilities, display_refresh_summary, display_stats, display_tickets,
};
use megasena_cli::import;
use megasena_cli::refresh::{self, HttpDrawSource};
use megasena_db::db::{count_draws, fetch_all_draws, fetch_last_draws, insert_draws, latest_contest, migrate, open_db};
use megasena_db::models::Ticket;
use megasena_db::rusqlite::Connection;
use megasena_db::store::DrawStore;

#[derive(Parser)]
#[command(name = "megasena", about = "Analyseur de tirages Mega-Sena")]
struct Cli {
    /// Fichier de configuration JSON
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Chemin de la base (remplace celui de la configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis le CSV de l'éditeur (`;`, Latin-1)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "Mega-Sena.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher les statistiques (fréquences et retards)
    Stats {
        /// Interroger l'API avant le calcul
        #[arg(long)]
        refresh: bool,
    },

    /// Générer des grilles pondérées par fréquence et retard
    Generate {
        /// Poids du retard, entre 0 et 1
        #[arg(short, long)]
        delay_bias: Option<f64>,

        /// Nombre de grilles
        #[arg(short, long)]
        count: Option<usize>,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Afficher la distribution de probabilités
        #[arg(long)]
        probabilities: bool,

        /// Interroger l'API avant le calcul
        #[arg(long)]
        refresh: bool,
    },

    /// Fermeture : combinaisons de 6 parmi 7 à 15 numéros
    Closing {
        /// Numéros choisis
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<u8>,

        /// Nombre de grilles à afficher (tirées au hasard)
        #[arg(short, long)]
        sample: Option<usize>,

        /// Afficher toutes les combinaisons
        #[arg(long, conflicts_with = "sample")]
        all: bool,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Vérifier si une grille aurait gagné dans l'historique
    Backtest {
        /// 6 numéros
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<u8>,

        /// Interroger l'API avant le calcul
        #[arg(long)]
        refresh: bool,
    },

    /// Récupérer les concours publiés depuis le dernier en base
    Refresh,

    /// Afficher la configuration effective
    Config {
        /// Écrire la configuration dans le fichier
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }

    match cli.command {
        Command::Config { write } => cmd_config(&config, &cli.config, write),
        Command::DbPath => {
            println!("{}", config.db_path().display());
            Ok(())
        }
        command => run(command, &config),
    }
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    let conn = open_db(&config.db_path())?;
    migrate(&conn)?;

    match command {
        Command::Import { file } => cmd_import(&conn, &file)?,
        Command::List { last } => cmd_list(&conn, last)?,
        Command::Stats { refresh } => cmd_stats(&conn, config, refresh)?,
        Command::Generate {
            delay_bias,
            count,
            seed,
            probabilities,
            refresh,
        } => cmd_generate(&conn, config, delay_bias, count, seed, probabilities, refresh)?,
        Command::Closing {
            numbers,
            sample,
            all,
            seed,
        } => cmd_closing(config, &numbers, sample, all, seed)?,
        Command::Backtest { numbers, refresh } => cmd_backtest(&conn, config, &numbers, refresh)?,
        Command::Refresh => {
            let mut store = load_store(&conn)?;
            if store.is_empty() {
                println!("Base vide : la mise à jour repartira du concours 1. Préférez : megasena import");
            }
            refresh_from_remote(&conn, &mut store, config)?;
        }
        Command::Config { .. } | Command::DbPath => {}
    }

    display_footer(latest_contest(&conn)?);
    Ok(())
}

fn load_store(conn: &Connection) -> Result<DrawStore> {
    Ok(DrawStore::from_draws(fetch_all_draws(conn)?))
}

/// Charge l'historique, rafraîchi si demandé. `None` si la base est vide.
fn prepare_store(conn: &Connection, config: &AppConfig, refresh: bool) -> Result<Option<DrawStore>> {
    let mut store = load_store(conn)?;
    if refresh {
        refresh_from_remote(conn, &mut store, config)?;
    }
    if store.is_empty() {
        println!("Base vide. Lancez d'abord : megasena import");
        return Ok(None);
    }
    Ok(Some(store))
}

/// Un échec réseau est journalisé puis ignoré : on continue avec la base locale.
fn refresh_from_remote(conn: &Connection, store: &mut DrawStore, config: &AppConfig) -> Result<()> {
    let outcome = HttpDrawSource::new(&config.refresh.base_url, config.refresh.timeout())
        .and_then(|source| refresh::refresh_store(store, &source, config.refresh.max_fetch));

    match outcome {
        Ok(summary) => {
            insert_draws(conn, &summary.appended)?;
            display_refresh_summary(&summary);
        }
        Err(e) => {
            warn!("Mise à jour distante impossible : {e}");
            println!("(Mise à jour distante impossible, données locales conservées)");
        }
    }
    Ok(())
}

fn cmd_import(conn: &Connection, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : megasena import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, config: &AppConfig, refresh: bool) -> Result<()> {
    let Some(store) = prepare_store(conn, config, refresh)? else {
        return Ok(());
    };
    let freq = frequency(&store);
    let delays = delay(&store)?;
    display_stats(&number_stats(&freq, &delays), store.len());
    Ok(())
}

fn cmd_generate(
    conn: &Connection,
    config: &AppConfig,
    delay_bias: Option<f64>,
    count: Option<usize>,
    seed: Option<u64>,
    show_probabilities: bool,
    refresh: bool,
) -> Result<()> {
    let delay_bias = delay_bias.unwrap_or(config.delay_bias);
    let count = count.unwrap_or(config.ticket_count);
    if count == 0 || count > config.max_tickets {
        bail!("Nombre de grilles entre 1 et {} attendu, reçu {}", config.max_tickets, count);
    }

    let Some(store) = prepare_store(conn, config, refresh)? else {
        return Ok(());
    };

    let freq = frequency(&store);
    let delays = delay(&store)?;
    let distribution = weighted_pick_with(&freq, &delays, delay_bias, config.epsilon)?;

    if show_probabilities {
        let mut probs = distribution.to_number_probabilities();
        tag_probabilities(&mut probs);
        display_probabilities(&probs, delay_bias);
    }

    let mut rng = seeded_rng(seed);
    let tickets = generate_tickets(&distribution, count, &mut rng)?;
    display_tickets(&tickets, &distribution);
    Ok(())
}

fn cmd_closing(
    config: &AppConfig,
    numbers: &[u8],
    sample: Option<usize>,
    all: bool,
    seed: Option<u64>,
) -> Result<()> {
    let wheel = closing_combinations(numbers)?;
    let combinations: Vec<Ticket> = wheel.iter().collect();

    let shown = if all {
        combinations
    } else {
        let size = sample.unwrap_or_else(|| config.closing_sample.min(wheel.len()));
        let mut rng = seeded_rng(seed);
        sample_combinations(&combinations, size, &mut rng)?
    };

    display_closing(&wheel, &shown);
    Ok(())
}

fn cmd_backtest(conn: &Connection, config: &AppConfig, numbers: &[u8], refresh: bool) -> Result<()> {
    let ticket = Ticket::new(numbers).context("Une grille de 6 numéros distincts (1-60) est attendue")?;

    let Some(store) = prepare_store(conn, config, refresh)? else {
        return Ok(());
    };
    let report = backtest(&store, &ticket);
    display_backtest(&ticket, &report);
    Ok(())
}

fn cmd_config(config: &AppConfig, path: &PathBuf, write: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if write {
        config.save(path)?;
        println!("\nConfiguration écrite dans : {}", path.display());
    }
    Ok(())
}
