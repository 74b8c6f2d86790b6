//! CLI subcommand implementations.

pub mod best;
pub mod cleanup;
pub mod goals;
pub mod labels;
pub mod previous;
pub mod recent;
pub mod record;
pub mod status;
pub mod util;

#[cfg(test)]
pub(crate) mod testing {
    use chrono::DateTime;
    use tally_core::{ManualClock, MemoryStore, StatsEngine};

    /// Saturday 2026-10-17, 09:00 local.
    pub fn saturday() -> ManualClock {
        ManualClock::new(DateTime::parse_from_rfc3339("2026-10-17T09:00:00+02:00").unwrap())
    }

    pub fn engine(clock: &ManualClock) -> StatsEngine<MemoryStore, &ManualClock> {
        StatsEngine::open(MemoryStore::new(), clock).unwrap()
    }

    pub fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap().trim_end().to_string()
    }
}
