use anyhow::{Context, Result};
use skyview_core::{Action, Orchestrator, Outcome, Query, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

const HELP: &str = "Type a city and press Enter to look it up.\n  \
                    :u  toggle metric / imperial\n  \
                    :r  refresh\n  \
                    :h  this help\n  \
                    :q  quit\n\
                    Start a city name with `::` if it begins with a colon.";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Action(Action),
    Help,
    Quit,
    Unknown(String),
    Empty,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        ":q" | ":quit" => Input::Quit,
        ":u" | ":units" => Input::Action(Action::ToggleUnits),
        ":r" | ":refresh" => Input::Action(Action::Refresh),
        ":h" | ":help" | "?" => Input::Help,
        cmd if cmd.starts_with(':') => match cmd.strip_prefix("::") {
            Some(rest) => Input::Action(Action::SubmitCity(format!(":{rest}"))),
            None => Input::Unknown(cmd.to_string()),
        },
        city => Input::Action(Action::SubmitCity(city.to_string())),
    }
}

/// Drive a [`Session`] from stdin until `:q` or end of input.
pub async fn run(orchestrator: Orchestrator, query: Query) -> Result<()> {
    let mut session = Session::new(orchestrator, query);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    announce(&session);
    session.start();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };

                match parse_input(&line) {
                    Input::Quit => break,
                    Input::Help => println!("{HELP}"),
                    Input::Empty => {}
                    Input::Unknown(cmd) => {
                        debug!(%cmd, "unrecognised command");
                        eprintln!("unknown command {cmd}, try :h");
                    }
                    Input::Action(action) => {
                        debug!(?action, "dispatching");
                        if session.dispatch(action) {
                            announce(&session);
                        } else {
                            debug!("nothing changed, no fetch issued");
                        }
                    }
                }
            }
            outcome = session.next_outcome() => match outcome {
                Outcome::Updated => {
                    let shell = session.shell();
                    if let Some(weather) = shell.weather() {
                        println!("\n{}\n", render::weather(weather, shell.background()));
                    }
                }
                Outcome::Failed { message, .. } => {
                    eprintln!("warning: {message}");
                    if session.shell().weather().is_some() {
                        eprintln!("(still showing the previous result)");
                    }
                }
                Outcome::Stale => debug!("ignored a superseded fetch result"),
            },
        }
    }

    Ok(())
}

fn announce(session: &Session) {
    let query = session.shell().query();
    println!("Fetching weather for {} ({})...", query.city, query.units);
}
