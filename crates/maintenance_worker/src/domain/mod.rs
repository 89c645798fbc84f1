mod agency_backfill;
mod checkin_records;
mod dispatcher;
mod expire_policies;

pub use agency_backfill::*;
pub use checkin_records::*;
pub use dispatcher::*;
pub use expire_policies::*;
