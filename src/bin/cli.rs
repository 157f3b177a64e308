// Room CLI
// Plays the shared-room games against a Room Store and the single-player games locally

use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;

use game_rooms::arcade::{self, Hangman, HangmanStatus, LetterScore, Wordle, WordleStatus};
use game_rooms::config::{ClientConfig, Config};
use game_rooms::logging;
use game_rooms::room::{PlayerSlot, RoomDocument, RoomSession};
use game_rooms::rules::{Cell, GameRules, GameStatus, Hand, RockPaperScissors, TicTacToe};
use game_rooms::store::{HttpRoomStore, RoomStore};
use game_rooms::words::WordClient;
use game_rooms::GameError;

#[derive(Parser)]
#[command(name = "room-cli")]
#[command(about = "Shared-room games and arcade games in the terminal", long_about = None)]
struct Cli {
    /// Room Store base URL (default: ROOM_STORE_URL or the public game-room API)
    #[arg(short, long)]
    store: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new room and print its code
    Create {
        #[arg(short, long, value_enum)]
        game: GameKind,
    },

    /// Print the current document of a room
    Show {
        #[arg(short, long)]
        room: String,
    },

    /// Play tic-tac-toe in a shared room
    TicTacToe {
        /// Your player name
        #[arg(short, long)]
        player: String,

        /// Room code to join; a new room is created when omitted
        #[arg(short, long)]
        room: Option<String>,
    },

    /// Play rock-paper-scissors in a shared room
    Rps {
        /// Your player name
        #[arg(short, long)]
        player: String,

        /// Room code to join; a new room is created when omitted
        #[arg(short, long)]
        room: Option<String>,
    },

    /// Guess a random word letter by letter
    Hangman,

    /// Guess a random five-letter word in six tries
    Wordle,
}

#[derive(Clone, Copy, ValueEnum)]
enum GameKind {
    TicTacToe,
    Rps,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };
    logging::init(config.log_format, "warn");

    let mut client_config = config.client.clone();
    if let Some(url) = cli.store {
        client_config.store_url = url;
    }

    match &cli.command {
        Commands::Create { game } => {
            let Some(store) = connect(&client_config) else { return };
            create_room(store, *game).await;
        }
        Commands::Show { room } => {
            let Some(store) = connect(&client_config) else { return };
            show_room(store, room).await;
        }
        Commands::TicTacToe { player, room } => {
            let Some(store) = connect(&client_config) else { return };
            play_tic_tac_toe(store, &client_config, player, room.as_deref()).await;
        }
        Commands::Rps { player, room } => {
            let Some(store) = connect(&client_config) else { return };
            play_rps(store, &client_config, player, room.as_deref()).await;
        }
        Commands::Hangman => match WordClient::new(config.words.clone()) {
            Ok(words) => play_hangman(&words).await,
            Err(e) => println!("{} {}", "✗".red(), e),
        },
        Commands::Wordle => match WordClient::new(config.words.clone()) {
            Ok(words) => play_wordle(&words).await,
            Err(e) => println!("{} {}", "✗".red(), e),
        },
    }
}

fn connect(config: &ClientConfig) -> Option<Arc<dyn RoomStore>> {
    match HttpRoomStore::new(config) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            None
        }
    }
}

async fn create_room(store: Arc<dyn RoomStore>, game: GameKind) {
    println!("{}", "Creating room...".cyan());

    let seed = match game {
        GameKind::TicTacToe => TicTacToe::seed(),
        GameKind::Rps => RockPaperScissors::seed(),
    };

    match store.create(&seed).await {
        Ok(created) => {
            println!("{} Room created", "✓".green());
            println!("  Room Code: {}", created.room_id.bold().blue());
        }
        Err(e) => println!("{} Cannot create room: {}", "✗".red(), e),
    }
}

async fn show_room(store: Arc<dyn RoomStore>, room_id: &str) {
    match store.fetch(room_id).await {
        Ok(doc) => {
            println!("{} Room {}", "✓".green(), room_id.bold());
            print_players(&doc);
            if doc.board.is_some() {
                print_board(&doc);
            }
            print_history(&doc);
            if let Ok(json) = serde_json::to_string_pretty(&doc) {
                println!("\n{}", json.dimmed());
            }
        }
        Err(GameError::RoomNotFound(_)) => println!("{} Room not found.", "✗".red()),
        Err(e) => println!("{} Cannot reach room store: {}", "✗".red(), e),
    }
}

async fn open_session<G: GameRules>(
    store: Arc<dyn RoomStore>,
    room_id: Option<&str>,
) -> Option<RoomSession<G>> {
    match RoomSession::<G>::join_or_create(store, room_id).await {
        Ok(session) => {
            println!("{} Room Code: {}", "✓".green(), session.room_id().bold().blue());
            Some(session)
        }
        Err(GameError::RoomNotFound(_)) => {
            println!("{} Room not found.", "✗".red());
            None
        }
        Err(e) => {
            println!("{} Cannot open room: {}", "✗".red(), e);
            None
        }
    }
}

/// Prints every change of the session's view until the session ends
fn spawn_renderer<G: GameRules>(
    session: &RoomSession<G>,
    render: fn(&RoomDocument),
) -> tokio::task::JoinHandle<()> {
    let mut view = session.subscribe();

    tokio::spawn(async move {
        let mut last = view.borrow_and_update().clone();
        while view.changed().await.is_ok() {
            let doc = view.borrow_and_update().clone();
            if doc != last {
                println!();
                render(&doc);
                print!("{} ", "►".cyan());
                io::stdout().flush().ok();
                last = doc;
            }
        }
    })
}

fn read_command() -> Option<String> {
    print!("{} ", "►".cyan());
    io::stdout().flush().ok();

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

fn report_error(e: &GameError) {
    if e.is_rejection() {
        println!("{} {}", "!".yellow(), e.to_string().yellow());
    } else {
        println!("{} {}", "✗".red(), e);
    }
}

async fn play_tic_tac_toe(
    store: Arc<dyn RoomStore>,
    config: &ClientConfig,
    player: &str,
    room_id: Option<&str>,
) {
    let Some(session) = open_session::<TicTacToe>(store, room_id).await else { return };

    let poll = session.start_polling(config.poll_interval(TicTacToe::POLL_INTERVAL));
    let renderer = spawn_renderer(&session, render_tic_tac_toe);

    render_tic_tac_toe(&session.document().await);
    println!("Enter a move as {}, or {} for commands", "row col".cyan(), "help".cyan());

    while let Some(input) = read_command() {
        match input.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_room_help("row col", "0 2");
                continue;
            }
            "refresh" => {
                render_tic_tac_toe(&session.refresh().await);
                continue;
            }
            _ => {}
        }

        match input.parse::<Cell>() {
            Ok(cell) => match session.submit_move(player, cell).await {
                Ok(doc) => render_tic_tac_toe(&doc),
                Err(e) => report_error(&e),
            },
            Err(e) => report_error(&e),
        }
    }

    session.close();
    poll.stop();
    renderer.abort();
    println!("Goodbye!");
}

async fn play_rps(
    store: Arc<dyn RoomStore>,
    config: &ClientConfig,
    player: &str,
    room_id: Option<&str>,
) {
    let Some(session) = open_session::<RockPaperScissors>(store, room_id).await else { return };

    match session.claim_seat(player).await {
        Ok(slot) => println!("{} Seated as {}", "✓".green(), slot.to_string().bold()),
        Err(e) => {
            report_error(&e);
            return;
        }
    }

    let poll = session.start_polling(config.poll_interval(RockPaperScissors::POLL_INTERVAL));
    let renderer = spawn_renderer(&session, render_rps);

    render_rps(&session.document().await);
    println!("Play {}, or {} for commands", "rock | paper | scissors".cyan(), "help".cyan());

    while let Some(input) = read_command() {
        match input.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_room_help("rock | paper | scissors", "paper");
                continue;
            }
            "refresh" => {
                render_rps(&session.refresh().await);
                continue;
            }
            _ => {}
        }

        match input.parse::<Hand>() {
            Ok(hand) => match session.submit_move(player, hand).await {
                Ok(doc) => render_rps(&doc),
                Err(e) => report_error(&e),
            },
            Err(e) => report_error(&e),
        }
    }

    session.close();
    poll.stop();
    renderer.abort();
    println!("Goodbye!");
}

fn render_tic_tac_toe(doc: &RoomDocument) {
    print_players(doc);
    print_board(doc);

    let status = match TicTacToe::status(doc) {
        GameStatus::Won(slot) => format!("Winner: {}", player_label(doc, slot)).green().bold(),
        GameStatus::Draw => "Draw".yellow().bold(),
        GameStatus::InProgress { next: Some(slot) } => {
            format!("Next player: {} ({})", player_label(doc, slot), slot.mark()).normal()
        }
        GameStatus::InProgress { next: None } => "Waiting for players".normal(),
    };
    println!("{}", status);
}

fn render_rps(doc: &RoomDocument) {
    print_players(doc);
    println!("  Current Turn: {}", doc.current_player().unwrap_or("Waiting..."));

    let submitted: Vec<&str> = doc.moves.keys().map(String::as_str).collect();
    if !submitted.is_empty() {
        println!("  Waiting on the other hand ({} played)", submitted.join(", "));
    }
    print_history(doc);
}

fn player_label(doc: &RoomDocument, slot: PlayerSlot) -> String {
    doc.players
        .get(slot)
        .map(str::to_string)
        .unwrap_or_else(|| slot.to_string())
}

fn print_players(doc: &RoomDocument) {
    for slot in PlayerSlot::ALL {
        let name = doc.players.get(slot).unwrap_or("Waiting...");
        println!("  {}: {}", slot.to_string().bold(), name);
    }
}

fn print_board(doc: &RoomDocument) {
    let board = doc.board_or_empty();
    println!();
    for (i, row) in board.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Some(mark) => mark.to_string().bold().to_string(),
                None => ".".dimmed().to_string(),
            })
            .collect();
        println!("   {}", cells.join(" | "));
        if i + 1 < board.len() {
            println!("  ---+---+---");
        }
    }
    println!();
}

fn print_history(doc: &RoomDocument) {
    if doc.history.is_empty() {
        return;
    }
    println!("\n{}", "Game Log:".bold());
    for entry in &doc.history {
        println!("  {}", entry);
    }
}

fn print_room_help(move_syntax: &str, example: &str) {
    println!("\n{}", "Room Commands".bold());
    println!("{}", "─".repeat(60));
    println!("  {:<24} submit a move, e.g. {}", move_syntax.cyan(), example);
    println!("  {:<24} fetch the latest room state now", "refresh".cyan());
    println!("  {:<24} leave the room", "quit, exit".cyan());
    println!();
}

async fn play_hangman(words: &WordClient) {
    println!("{}", "Fetching a word...".cyan());
    let answer = match words.random_word(arcade::hangman::WORD_LENGTH).await {
        Ok(word) => word,
        Err(e) => {
            println!("{} Cannot fetch a word: {}", "✗".red(), e);
            return;
        }
    };

    let mut game = Hangman::new(&answer);
    while game.status() == HangmanStatus::Playing {
        let masked: Vec<String> = game.masked().chars().map(String::from).collect();
        println!(
            "\n  {}    Number Wrong: {}/{}",
            masked.join(" ").bold(),
            game.wrong_guesses(),
            game.max_wrong()
        );

        let Some(input) = read_command() else { return };
        if input == "quit" {
            return;
        }
        for letter in input.chars() {
            game = arcade::guess(game, letter);
        }
    }

    match game.status() {
        HangmanStatus::Won => println!("\n{}", "You WIN!".green().bold()),
        _ => {
            println!("\n{}", "YOU LOSE".red().bold());
            println!("  Correct Word is: {}", game.answer().bold());
        }
    }
}

async fn play_wordle(words: &WordClient) {
    println!("{}", "Fetching a word...".cyan());
    let target = match words.random_word(arcade::wordle::WORD_LENGTH).await {
        Ok(word) => word,
        Err(e) => {
            println!("{} Cannot fetch a word: {}", "✗".red(), e);
            return;
        }
    };

    let mut game = Wordle::new(&target);
    println!("Type a {}-letter word and press Enter", arcade::wordle::WORD_LENGTH);

    while game.status() == WordleStatus::Playing {
        let Some(input) = read_command() else { return };
        if input == "quit" {
            return;
        }

        if !words.is_valid(&input).await {
            println!("{} Invalid word!", "!".yellow());
            continue;
        }

        match game.submit(&input) {
            Ok(attempt) => {
                let tiles: Vec<String> = attempt
                    .word
                    .chars()
                    .zip(&attempt.scores)
                    .map(|(letter, score)| {
                        let tile = format!(" {} ", letter);
                        match score {
                            LetterScore::Correct => tile.black().on_green().to_string(),
                            LetterScore::Misplaced => tile.black().on_yellow().to_string(),
                            LetterScore::Incorrect => tile.white().on_bright_black().to_string(),
                        }
                    })
                    .collect();
                println!("  {}   ({} left)", tiles.join(""), game.remaining());
            }
            Err(e) => report_error(&e),
        }
    }

    if game.status() == WordleStatus::Won {
        println!(
            "\n{} Solved in {}/{} tries.",
            "Congratulations! You won!".green().bold(),
            game.attempts().len(),
            arcade::wordle::MAX_ATTEMPTS
        );
    } else {
        println!("\n{} The word was {}.", "Game Over!".red().bold(), game.target().bold());
    }
}
