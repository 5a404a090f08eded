pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, file_failed, file_new, file_skipped, header, info, section, success, summary_row,
    verdict, warn,
};
pub use progress::ImportProgress;
pub use table::{sources_table, stats_table};
pub use theme::{theme, Theme};
