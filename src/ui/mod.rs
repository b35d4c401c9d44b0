pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, location_row, section, success, symbol_section, warn};
pub use table::{merge_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
