//! Greeter Example
//!
//! Three webhook endpoints, each backed by its own handler chain:
//!
//! ```text
//! POST /greet    greet intent, else a generic fallback
//! POST /weather  weather + location, then weather alone (asks for a city)
//! POST /news     unconditional headline digest
//! ```
//!
//! Routes are tried in order. A route whose requirements are not met, or
//! whose handler fails, hands the request to the next one; if every route
//! passes the caller receives a bare `500`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package greeter -- --config palaver.toml
//! ```

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use palaver::prelude::*;
use serde_json::Value;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (defaults to palaver.toml in the current directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `production`.
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Handler Functions
// ============================================================================

async fn greet(Intents(intents): Intents) -> Response {
    let confident = intents
        .first()
        .and_then(WitEntity::confidence)
        .is_some_and(|c| c >= 0.8);

    if confident {
        Response::text("Hello there! 👋 How can I help?")
    } else {
        Response::text("Hi! 🙂")
    }
}

async fn fallback_greeting() -> Response {
    Response::text("Sorry, I didn't catch that. Try saying hello.")
}

/// Requires the `location` entity, checked by the route.
async fn weather_for_location(entities: Entities) -> Result<Response> {
    let Some(city) = entities.first("location").and_then(WitEntity::value_str) else {
        bail!("location entity has no string value");
    };

    let forecast = if entities.has_value("datetime", "tomorrow") {
        "Tomorrow"
    } else {
        "Today"
    };
    Ok(Response::text(format!("{forecast} in {city}: sunny ☀️, 24°C")))
}

async fn ask_for_location() -> Response {
    Response::text("Which city? 🌍")
}

const INTRODUCTIONS: [&str; 3] = [
    "Here are today's top stories",
    "This is what's happening",
    "Today's headlines are",
];

const HEADLINES: [&str; 3] = [
    "City council approves new cycle lanes",
    "Local team wins regional final 🏆",
    "Spring festival returns this weekend",
];

/// Unconditional digest; the intro rotates on the payload size.
async fn news(Payload(payload): Payload) -> Value {
    let intro = INTRODUCTIONS[payload.to_string().len() % INTRODUCTIONS.len()];
    let headlines: String = HEADLINES.iter().map(|h| format!("- {h}\n")).collect();

    serde_json::json!({
        "text": format!("{intro}\n{headlines}"),
        "type": 1
    })
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = PalaverRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    runtime.register(
        "/greet",
        HandlerChain::new()
            .with(on_intent("greet", greet))
            .with(route(fallback_greeting).name("fallback")),
    )?;

    runtime.register(
        "/weather",
        HandlerChain::new()
            .with(
                on_intent("weather", weather_for_location)
                    .name("weather-in-city")
                    .entity("location"),
            )
            .with(on_intent("weather", ask_for_location).name("weather-ask-city")),
    )?;

    runtime.register("/news", HandlerChain::new().with(route(news).name("news")))?;

    info!(routes = ?runtime.paths(), "Greeter ready");
    runtime.run().await?;

    Ok(())
}
