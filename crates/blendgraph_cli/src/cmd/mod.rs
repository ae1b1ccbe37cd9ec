/// Compiled layout inspection command.
pub mod dna;
/// File-level information command.
pub mod info;
/// Instance listing command.
pub mod list;
/// Single record decode command.
pub mod show;

mod util;
