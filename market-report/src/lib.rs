//! Market report generation: five specialised agents research a company
//! idea and the replies are assembled into a Word document.

pub mod agents;
pub mod ai;
pub mod config;
pub mod dashboard;
pub mod docx;
pub mod error;
pub mod formatter;
pub mod pipeline;
pub mod tools;
