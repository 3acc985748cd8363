//! # Duel Client Library
//!
//! Client side of a server-authoritative, turn-based spell-typing duel. The server
//! decides everything about the match; this library mirrors its snapshots, keeps
//! the local phase-scoped state in step with them, and forwards the player's intents.
//!
//! ## Architecture Overview
//!
//! Inbound data flows one way: frames arrive on the [`network::Connection`], are
//! decoded and routed by [`dispatch`], and land in the [`game::GameSession`]. Outbound
//! intents flow the other way: user actions mutate the session through its public
//! operations, the session queues protocol messages, and the controller sends them.
//!
//! ### Phase Reconciliation
//! The session never advances the game on its own. It compares the phase of each
//! new snapshot with the last phase it applied side effects for, and runs the
//! entry/exit work for that edge exactly once. Snapshots that arrive before the
//! server has told us who we are are buffered, and their edge is replayed as soon
//! as the identity is known.
//!
//! ### Countdowns
//! Typing and resolution countdowns tick locally from an anchor captured when the
//! phase began. Server hints seed them once; they are never corrected mid-phase.
//!
//! ### Typing
//! Typed text is diffed against the incantation on every change, and every way of
//! finishing the challenge funnels through a single one-shot submission.
//!
//! ## Module Organization
//!
//! - `network`: address normalization, the WebSocket connection, the event loop
//! - `dispatch`: frame decoding and routing by message tag
//! - `game`: the phase reconciliation state machine and the derived view
//! - `timer`: cooperative countdowns
//! - `typing`: the typing diff and submission guard
//! - `session`: server-assigned identity and per-turn local state
//! - `input` / `console`: the thin terminal front end
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("localhost:8000", ClientConfig::default()).await?;
//!     client.join("ABCD", "Ada", 30).await;
//!     client.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod session;
pub mod timer;
pub mod typing;
