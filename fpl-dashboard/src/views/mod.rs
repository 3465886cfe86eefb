// View-model derivations.
//
// Pure functions from loaded league data to the rows and summaries each
// screen renders. Nothing here touches the network or the terminal.

pub mod breakdown;
pub mod fixtures;
pub mod history;
pub mod luck;
pub mod ownership;
pub mod standings;
pub mod transfers;
