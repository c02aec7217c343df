//! ProductFeed Core - Merchant Feed Compiler
//!
//! # The Five Laws (Non-Negotiable)
//! 1. Schema Order Is Contract
//! 2. Overrides Beat Defaults
//! 3. Validate Before Render
//! 4. Invalid Entries Are Dropped, Never Partial
//! 5. Strategies Compute, Engine Enforces

pub mod config;
pub mod product;
pub mod money;
pub mod links;
pub mod value;
pub mod strategies;
pub mod schema;
pub mod fields;
pub mod resolver;
pub mod engine;
pub mod document;
pub mod renderer;
pub mod logging;

pub use config::{FeedConfig, ChannelConfig, ConfigError};
pub use product::{ProductSnapshot, Properties, load_catalog};
pub use money::{MoneyFormatter, CurrencyQualified};
pub use links::{ProductUrlBuilder, SlugUrlBuilder};
pub use value::{FieldValue, ResolvedValue, ValueSource};
pub use strategies::{Availability, Sale, Strategies};
pub use schema::{FieldSchema, SchemaNode, SchemaError};
pub use fields::{FieldRegistry, FieldDefault};
pub use resolver::{MissingMandatoryField, OverrideSet, RenderEntry, RenderEnv};
pub use engine::{FeedItem, FeedNode, SchemaEngine, WalkMode};
pub use document::FeedDocument;
pub use renderer::{FeedRenderer, FeedError, EntryCheck};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
