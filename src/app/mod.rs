// Presentation: turns analyses into terminal output.

pub mod report;
