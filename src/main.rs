//! Connections entry point
//!
//! Native builds run a line-based terminal frontend; the browser build enters
//! through `connections::web`.

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::error::Error;
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;

    use clap::Parser;

    use connections::consts::MAX_MISTAKES;
    use connections::persistence::{FileStorage, GameStorage};
    use connections::{Intent, Outcome, PuzzleCollection, Session, SessionEvent, Settings};

    #[derive(Parser, Debug)]
    #[command(version, about = "Find four groups of four")]
    pub struct Args {
        /// Puzzle source (JSON)
        #[arg(short, long)]
        puzzles: Option<PathBuf>,
        /// Directory for saved progress, stats and settings
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Fixed shuffle seed
        #[arg(long)]
        seed: Option<u64>,
        /// Settings file (defaults to <data-dir>/settings.json)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Clear today's saved progress before starting
        #[arg(long)]
        reset: bool,
        /// Print lifetime stats and exit
        #[arg(long)]
        stats: bool,
        /// Write the effective settings (including overrides) back to the settings file
        #[arg(long)]
        save_settings: bool,
    }

    const HELP: &str = "\
commands:
  <word>     select or deselect a word
  submit     check the four selected words
  shuffle    shuffle the board
  clear      deselect all words
  reset      forget today's progress
  stats      show lifetime stats
  quit       leave (progress is saved)";

    fn resolve_settings(args: &Args) -> Result<Settings, Box<dyn Error>> {
        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| Settings::default().data_dir);
        let path = args
            .settings
            .clone()
            .unwrap_or_else(|| data_dir.join(Settings::FILE_NAME));

        let mut settings = Settings::load(&path)?;
        if let Some(puzzles) = &args.puzzles {
            settings.puzzle_path = puzzles.clone();
        }
        if let Some(dir) = &args.data_dir {
            settings.data_dir = dir.clone();
        }
        if args.seed.is_some() {
            settings.seed = args.seed;
        }
        if args.save_settings {
            settings.save(&path)?;
            println!("Settings written to {}", path.display());
        }
        Ok(settings)
    }

    pub fn run(args: Args) -> Result<(), Box<dyn Error>> {
        let settings = resolve_settings(&args)?;
        let storage = GameStorage::new(FileStorage::open(&settings.data_dir)?);

        if args.stats {
            print_stats(&storage);
            return Ok(());
        }

        let puzzle = PuzzleCollection::load(&settings.puzzle_path)
            .map_err(|e| format!("cannot start: {e}"))?
            .into_first()?;

        let mut session = Session::start(puzzle, storage, settings.effective_seed());
        if args.reset {
            session.handle(Intent::Reset);
        }
        session.take_events();

        println!("Connections - puzzle #{}", session.puzzle_number());
        println!("{HELP}");
        print_board(&session);

        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("> ");
            io::stdout().flush()?;
            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let input = line.trim();
            let intent = match input.to_lowercase().as_str() {
                "" => continue,
                "quit" | "q" | "exit" => break,
                "help" | "?" => {
                    println!("{HELP}");
                    continue;
                }
                "stats" => {
                    print_stats(session.storage());
                    continue;
                }
                "submit" | "s" => Intent::Submit,
                "shuffle" => Intent::Shuffle,
                "clear" => Intent::DeselectAll,
                "reset" => Intent::Reset,
                _ => match find_word(&session, input) {
                    Some(word) => Intent::Toggle { word },
                    None => {
                        println!("{input:?} is not on the board");
                        continue;
                    }
                },
            };

            session.handle(intent);
            let events = session.take_events();
            report_events(&session, events, &settings);
            print_board(&session);
        }

        Ok(())
    }

    fn find_word(session: &Session<FileStorage>, input: &str) -> Option<String> {
        session
            .pool()
            .iter()
            .find(|w| w.eq_ignore_ascii_case(input))
            .cloned()
    }

    fn report_events(session: &Session<FileStorage>, events: Vec<SessionEvent>, settings: &Settings) {
        for event in events {
            match event {
                SessionEvent::GroupSolved { group, .. } => {
                    println!("Correct! {}: {}", group.description, group.words.join(", "));
                }
                SessionEvent::MistakesChanged { remaining } if remaining < MAX_MISTAKES => {
                    println!("Not quite. Mistakes remaining: {remaining}");
                }
                SessionEvent::OutcomeChanged {
                    outcome: Outcome::Won,
                } => {
                    println!("You won with {} mistake(s)!", session.mistakes_made());
                }
                SessionEvent::OutcomeChanged {
                    outcome: Outcome::Lost,
                } => {
                    println!("Out of mistakes.");
                    if settings.reveal_solution_on_loss {
                        for (_, group) in session.solution().unwrap_or_default() {
                            println!("  {}: {}", group.description, group.words.join(", "));
                        }
                    }
                }
                SessionEvent::Restarted => println!("Progress reset."),
                SessionEvent::PersistenceFailed { message } => {
                    println!("(progress not saved: {message})");
                }
                _ => {}
            }
        }
    }

    fn print_board(session: &Session<FileStorage>) {
        println!();
        for (key, group) in session.solved_groups() {
            println!(
                "[{}] {}: {}",
                key.as_str(),
                group.description,
                group.words.join(", ")
            );
        }

        for row in session.pool().chunks(4) {
            let cells: Vec<String> = row
                .iter()
                .map(|w| {
                    if session.selected().contains(w) {
                        format!("*{w}*")
                    } else {
                        w.clone()
                    }
                })
                .collect();
            println!("  {}", cells.join("  "));
        }

        match session.outcome() {
            Outcome::Playing => println!(
                "Mistakes remaining: {}  Selected: {}/4",
                "o".repeat(session.mistakes_remaining() as usize),
                session.selected().len()
            ),
            Outcome::Won => println!("Solved! Come back tomorrow for a new puzzle."),
            Outcome::Lost => println!("Game over. Come back tomorrow for a new puzzle."),
        }
    }

    fn print_stats(storage: &GameStorage<FileStorage>) {
        match storage.load_stats() {
            Ok(stats) if stats.is_empty() => println!("No games won yet."),
            Ok(stats) => {
                println!("Games won: {}", stats.games_played);
                println!("Perfect games: {}", stats.perfect_games());
                if let Some(avg) = stats.average_mistakes() {
                    println!("Average mistakes: {avg:.2}");
                }
                for (mistakes, count) in stats.distribution().iter().enumerate() {
                    println!("  {mistakes} mistake(s): {count}");
                }
            }
            Err(e) => log::warn!("Failed to load stats: {e}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::init();
    log::info!("Connections (native) starting...");

    match terminal::run(terminal::Args::parse()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is connections::web, this is just to satisfy the compiler
}
