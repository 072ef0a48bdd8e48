//! Catalog harvest — scroll-convergence control, product extraction, taxonomy, and CSV export
//! for infinitely-scrolling catalog pages.

pub mod config;
pub mod export;
pub mod extract;
pub mod html;
pub mod pipeline;
pub mod price;
pub mod scroll;
pub mod session;
pub mod taxonomy;
pub mod title;
pub mod types;

pub use config::{HarvestConfig, ScrollMode, ScrollPolicy, SessionTiming};
pub use export::{write_csv, write_csv_file, Column, ExportColumns};
pub use extract::{ItemExtractor, RawFields};
pub use html::{HtmlNode, HtmlPage};
pub use pipeline::{retain_and_dedupe, Harvest, HarvestPipeline};
pub use price::parse_price;
pub use scroll::{ScrollController, ScrollOutcome, ScrollState, TickSample};
pub use session::{NodeHandle, PageSession};
pub use taxonomy::{Taxonomy, TaxonomyRules};
pub use title::normalize_title;
pub use types::*;
