//! demogrip - clone a demo repository, install its dependencies and
//! launch its Gradio or Streamlit app on a fixed port.

pub mod cli;
pub mod core;
pub mod git;
pub mod gpu;
pub mod pip;
pub mod process;
pub mod telemetry;
pub mod util;
