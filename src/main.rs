// ============================================================================
// MarketNav - Point d'entrée
// ============================================================================
// Deux modes :
// - `marketnav`        : navigateur TUI (graphiques, événements, inflation)
// - `marketnav update` : met à jour le cache JSON (Yahoo Finance + FRED)
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui applique des commandes et exécute des effets
// 3. Async dans sync : un thread worker possède son runtime tokio
// 4. Channels mpsc : le worker renvoie des Command::SeriesLoaded à l'UI
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use marketnav::app::{App, Command, Effect};
use marketnav::cache::SeriesLoader;
use marketnav::config::Config;
use marketnav::error::LoadError;
use marketnav::models::CpiTable;
use marketnav::store::DataStore;
use marketnav::ui::{command_for, render, Event, EventHandler};
use marketnav::updater;

// ============================================================================
// WorkerCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des demandes de chargement au worker
// - Le worker lance UNE tâche tokio par chargement (en parallèle)
// - Chaque tâche renvoie son résultat sous forme de Command
// ============================================================================

#[derive(Debug)]
enum WorkerCommand {
    /// Charger la série d'un instrument depuis le cache JSON
    Load(String),
}

// ============================================================================
// Logging
// ============================================================================

/// Initialise le logging vers fichier (rotation quotidienne)
///
/// CONCEPT RUST : Tracing subscriber
/// - Registry : point central des logs
/// - Layer : transforme et route les logs
/// - EnvFilter : filtre par niveau (RUST_LOG env var)
/// - Option<Layer> est aussi un Layer : la sortie console est optionnelle
///
/// # Arguments
/// * `log_dir` - Répertoire des logs (voir Config)
/// * `with_stdout` - Recopie les logs sur la console (mode update)
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/marketnav/logs/marketnav.log
/// RUST_LOG=marketnav=trace marketnav
/// ```
fn init_logging(log_dir: &Path, with_stdout: bool) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    // Nouveau fichier chaque jour : marketnav.log.2024-01-15
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "marketnav.log");

    let console = with_stdout.then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(console)
        .with(
            // Par défaut : debug pour marketnav, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketnav=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du logging")?;

    info!(log_dir = %log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::from_env();
    let mode = std::env::args().nth(1);

    match mode.as_deref() {
        None => run_browser(&config),
        Some("update") => run_update(&config),
        Some(other) => {
            anyhow::bail!("Commande inconnue : {} (usage : marketnav [update])", other)
        }
    }
}

/// `marketnav update` : pipeline de mise à jour, logs aussi sur la console
fn run_update(config: &Config) -> Result<()> {
    if let Err(e) = init_logging(&config.log_dir, true) {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
    }

    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let summary = runtime.block_on(updater::run_update(config))?;

    println!(
        "✅ Mise à jour terminée : {} écrits, {} inchangés, {} en échec",
        summary.written, summary.unchanged, summary.failed
    );
    Ok(())
}

/// Mode TUI
fn run_browser(config: &Config) -> Result<()> {
    // Logs uniquement dans le fichier : la console appartient à la TUI
    init_logging(&config.log_dir, false).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(data_dir = %config.data_dir.display(), "MarketNav starting up");
    let store = DataStore::new(&config.data_dir);

    // La table CPI est chargée une fois, avant la première frame
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let cpi = runtime.block_on(store.read_cpi()).unwrap_or_else(|e| {
        error!(error = ?e, "Failed to read CPI data, inflation adjustment disabled");
        CpiTable::default()
    });
    drop(runtime);
    info!(entries = cpi.len(), "CPI table loaded");

    let mut app = App::new(cpi, Local::now().date_naive());

    // CONCEPT RUST : mpsc channels
    // - worker_tx/rx : demandes de chargement vers le worker
    // - result_tx/rx : Command::SeriesLoaded vers l'event loop
    let (worker_tx, worker_rx) = mpsc::channel::<WorkerCommand>();
    let (result_tx, result_rx) = mpsc::channel::<Command>();

    info!("Spawning background worker thread");
    spawn_background_worker(store, worker_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &worker_tx, &result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }
    result
}

// ============================================================================
// Worker thread
// ============================================================================

/// Worker thread qui charge les séries en arrière-plan
///
/// CONCEPT RUST : Thread + async runtime
/// - std::thread::spawn() : crée un thread OS
/// - tokio::runtime::Runtime : runtime multi-thread dans ce thread
/// - runtime.spawn() : une tâche par chargement, sans attendre la précédente
/// - Le worker ne touche jamais à App : il ne fait que renvoyer des Command
fn spawn_background_worker(
    store: DataStore,
    worker_rx: mpsc::Receiver<WorkerCommand>,
    result_tx: mpsc::Sender<Command>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, background loads disabled");
                return;
            }
        };

        // recv() retourne Err quand l'event loop a lâché worker_tx : fin du thread
        while let Ok(command) = worker_rx.recv() {
            debug!(?command, "Worker received command");

            match command {
                WorkerCommand::Load(id) => {
                    let store = store.clone();
                    let result_tx = result_tx.clone();

                    runtime.spawn(async move {
                        let load = tokio::spawn({
                            let id = id.clone();
                            async move { store.load(&id).await }
                        });

                        // Une tâche qui panique ne doit pas laisser l'entrée en "Loading"
                        let result = match load.await {
                            Ok(result) => result,
                            Err(e) => {
                                error!(id = %id, error = ?e, "Load task aborted");
                                Err(LoadError::Aborted { id: id.clone() })
                            }
                        };

                        if result_tx.send(Command::SeriesLoaded { id, result }).is_err() {
                            debug!("Event loop closed, dropping load result");
                        }
                    });
                }
            }
        }

        info!("Background worker stopped");
    });
}

// ============================================================================
// Event loop
// ============================================================================

/// Applique une commande et exécute ses effets
///
/// Retourne true si l'interface doit être redessinée.
fn dispatch(app: &mut App, command: Command, worker_tx: &mpsc::Sender<WorkerCommand>) -> bool {
    let effects = app.update(command);
    run_effects(effects, worker_tx)
}

fn run_effects(effects: Vec<Effect>, worker_tx: &mpsc::Sender<WorkerCommand>) -> bool {
    let mut redraw = false;
    for effect in effects {
        match effect {
            Effect::Load(id) => {
                debug!(id = %id, "Requesting background load");
                if worker_tx.send(WorkerCommand::Load(id)).is_err() {
                    error!("Worker thread disconnected, load request dropped");
                }
            }
            Effect::Redraw => redraw = true,
        }
    }
    redraw
}

/// Boucle principale : résultats du worker -> rendu -> entrée clavier
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    worker_tx: &mpsc::Sender<WorkerCommand>,
    result_rx: &mpsc::Receiver<Command>,
) -> Result<()> {
    let mut dirty = run_effects(app.init(), worker_tx);
    let mut worker_alive = true;

    while app.is_running() {
        // ========================================
        // 0. RÉSULTATS : vide la file du worker sans bloquer
        // ========================================
        loop {
            match result_rx.try_recv() {
                Ok(command) => dirty |= dispatch(app, command, worker_tx),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        warn!("Worker result channel disconnected");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        // ========================================
        // 1. RENDER : seulement si l'état a changé
        // ========================================
        if dirty {
            terminal.draw(|frame| render(frame, app))?;
            dirty = false;
        }

        // ========================================
        // 2. INPUT : clavier -> Command
        // ========================================
        match events.next()? {
            Event::Resize => dirty = true,
            event => {
                if let Some(command) = command_for(&event) {
                    dirty |= dispatch(app, command, worker_tx);
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Terminal
// ============================================================================

/// Configure le terminal en mode TUI
///
/// CONCEPT : Raw mode + alternate screen
/// - Les caractères ne sont pas affichés automatiquement
/// - Quand on quitte, l'écran précédent est restauré
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Échec de l'initialisation du terminal")
}

/// Restaure le terminal à son état normal
///
/// Appelé dans run_browser() même si la boucle a échoué.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
