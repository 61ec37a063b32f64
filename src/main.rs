use std::io::{self, BufRead, Write};

use clap::Parser;

use sugil::auth::AuthManager;
use sugil::commands::{parse_input, Command, CommandResult, HELP_TEXT};
use sugil::core::accumulator::CURSOR_MARKER;
use sugil::core::app::ChatApp;
use sugil::core::attachment::Attachment;
use sugil::core::config::Config;
use sugil::core::persona::Mode;
use sugil::core::session::Session;
use sugil::logging;

#[derive(Parser)]
#[command(name = "sugil")]
#[command(about = "A terminal math-tutor chat client using hosted Gemini and Gemma models")]
#[command(long_about = "Sugil is a line-oriented terminal chat tutor. Questions (and optionally \
an attached image) are routed to a hosted model, the persona steers the answer style, and \
the reply streams into the terminal.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY      API key (keyring takes precedence)\n\
  SUGIL_UNLOCK_TOKEN  Token for the elevated tier (keyring takes precedence)\n\
  SUGIL_LOG           Tracing filter, e.g. sugil=debug\n\n\
Type /help inside the chat for the command list.")]
struct Args {
    #[arg(
        short,
        long,
        help = "Tutoring mode: solver, hint-coach, or concept-coach"
    )]
    mode: Option<String>,
}

fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Interactive fallback when neither the keyring nor the environment
/// holds an API key.
fn prompt_for_api_key(auth: &AuthManager) -> io::Result<Option<String>> {
    eprintln!("No API key found in the keyring or GEMINI_API_KEY.");
    let Some(key) = prompt_line("Enter an API key (leave empty to abort): ")? else {
        return Ok(None);
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Ok(None);
    }
    if let Err(err) = auth.store_api_key(&key) {
        eprintln!("Could not store the key in the keyring: {err}");
        eprintln!("It will be used for this run only.");
        std::env::set_var(sugil::auth::API_KEY_ENV, &key);
    }
    Ok(Some(key))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let args = Args::parse();
    let mut config = Config::load()?;

    let mode_input = args
        .mode
        .or_else(|| config.default_mode.clone())
        .unwrap_or_else(|| "solver".to_string());
    let mode: Mode = match mode_input.parse() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let auth = AuthManager::new();
    if auth.resolve_api_key().is_none() && prompt_for_api_key(&auth)?.is_none() {
        eprintln!("An API key is required. Nothing was sent.");
        std::process::exit(1);
    }

    let mut app = ChatApp::new(&config, auth, Session::new(mode));
    let mut staged_image: Option<Attachment> = None;

    println!("Sugil ({} mode). Type /help for commands.", mode);

    loop {
        let Some(line) = prompt_line("you> ")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line) {
            CommandResult::Run(Command::Quit) => break,
            CommandResult::Run(Command::Help) => println!("{HELP_TEXT}"),
            CommandResult::Run(Command::Reset) => {
                app.session.reset();
                println!("Conversation cleared.");
            }
            CommandResult::Run(Command::SetMode(mode)) => {
                app.session.mode = mode;
                config.default_mode = Some(mode.as_str().to_string());
                if let Err(err) = config.save() {
                    eprintln!("Could not persist the mode choice: {err}");
                }
                println!("Mode set to {mode}.");
            }
            CommandResult::Run(Command::SetTier(tier)) => match app.session.select_tier(tier) {
                Ok(()) => println!("Tier set to {}.", tier.as_str()),
                Err(message) => eprintln!("{message}"),
            },
            CommandResult::Run(Command::Unlock { token }) => {
                if app.auth().verify_unlock_token(&token) {
                    app.session.unlock_elevated();
                    println!("Elevated tier unlocked. Switch with /tier elevated.");
                } else {
                    eprintln!("That token did not match.");
                }
            }
            CommandResult::Run(Command::AttachImage { path }) => {
                match Attachment::load(&path) {
                    Ok(attachment) => {
                        println!(
                            "Staged {} ({}x{}); it will ride along with your next question.",
                            attachment.mime_type, attachment.width, attachment.height
                        );
                        staged_image = Some(attachment);
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
            CommandResult::Run(Command::ClearImage) => {
                staged_image = None;
                println!("Staged image dropped.");
            }
            CommandResult::Invalid(message) => eprintln!("{message}"),
            CommandResult::ProcessAsMessage(text) => {
                let attachment = staged_image.take();
                let cancel = app.cancel_handle();
                let mut printed = 0usize;
                let result = {
                    let submit = app.submit(&text, attachment, |partial| {
                        let body = partial.strip_suffix(CURSOR_MARKER).unwrap_or(partial);
                        if body.len() > printed {
                            print!("{}", &body[printed..]);
                            let _ = io::stdout().flush();
                            printed = body.len();
                        }
                    });
                    tokio::pin!(submit);
                    // Ctrl-C stops the in-flight stream instead of the program.
                    loop {
                        tokio::select! {
                            result = &mut submit => break result,
                            _ = tokio::signal::ctrl_c() => cancel.cancel(),
                        }
                    }
                };
                match result {
                    Ok(_) => println!(),
                    Err(err) => {
                        if printed > 0 {
                            println!();
                        }
                        eprintln!("{err}");
                    }
                }
            }
        }
    }

    Ok(())
}
