mod load;
mod types;

pub use load::{get_pdes_data_dir, load_config, load_default, load_from_path};
pub use types::*;
