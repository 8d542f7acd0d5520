use crate::error::Result;
use crate::utils::table;

pub fn run() -> Result<()> {
    print!("{}", table::format_catalog());
    Ok(())
}
