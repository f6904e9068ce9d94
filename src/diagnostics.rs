//! Leveled diagnostics for the engine.
//!
//! The engine never writes to stdout or a global logger directly, every message goes through the
//! [DiagnosticsSink] handed to the [generator](crate::generator::PuzzleGenerator).
//! [LogSink] forwards to the `log` facade and is what you get by default.

use std::sync::Mutex;
use log::Level;

pub trait DiagnosticsSink: Send + Sync
{
    fn record(&self, level: Level, message: &str);

    fn debug(&self, message: &str)
    {
        self.record(Level::Debug, message);
    }

    fn info(&self, message: &str)
    {
        self.record(Level::Info, message);
    }

    fn warn(&self, message: &str)
    {
        self.record(Level::Warn, message);
    }
}

/// Forwards to the `log` crate under the `vocab_crossword` target
#[derive(Clone, Copy, Default, Debug)]
pub struct LogSink;

impl DiagnosticsSink for LogSink
{
    fn record(&self, level: Level, message: &str)
    {
        log::log!(target: "vocab_crossword", level, "{message}");
    }
}

/// Drops everything
#[derive(Clone, Copy, Default, Debug)]
pub struct NullSink;

impl DiagnosticsSink for NullSink
{
    fn record(&self, _level: Level, _message: &str) {}
}

/// Keeps every record in memory, handy for asserting on warnings
#[derive(Default, Debug)]
pub struct MemorySink
{
    records: Mutex<Vec<(Level, String)>>,
}

impl MemorySink
{
    pub fn new() -> MemorySink
    {
        MemorySink::default()
    }

    pub fn records(&self) -> Vec<(Level, String)>
    {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Messages recorded at exactly `level`
    pub fn messages(&self, level: Level) -> Vec<String>
    {
        self.records().into_iter().filter(|(l, _)| *l == level).map(|(_, m)| m).collect()
    }
}

impl DiagnosticsSink for MemorySink
{
    fn record(&self, level: Level, message: &str)
    {
        if let Ok(mut records) = self.records.lock()
        {
            records.push((level, message.to_owned()));
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_memory_sink_filters_by_level()
    {
        let sink = MemorySink::new();
        sink.warn("disconnected");
        sink.debug("placed TEA");
        sink.warn("timed out");

        assert_eq!(sink.messages(Level::Warn), vec!["disconnected".to_owned(), "timed out".to_owned()]);
        assert_eq!(sink.records().len(), 3);
    }
}
