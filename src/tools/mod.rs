//! 外部协作者
//!
//! Search, code execution and chart rendering backends used by the research
//! nodes, bundled in a [`Toolkit`].

pub mod charts;
pub mod code;
pub mod search;

use std::sync::Arc;

pub use charts::{Chart, ChartRenderer, ChartRequest, DynChartRenderer, PlannedCharts};
pub use code::{CodeRun, CodeRunner, DryRunRunner, DynCodeRunner};
#[cfg(feature = "http-clients")]
pub use search::FirecrawlSearch;
pub use search::{DynWebSearch, PlaceholderSearch, SearchHit, WebSearch};

#[derive(Clone)]
pub struct Toolkit {
    pub search: DynWebSearch,
    pub code: DynCodeRunner,
    pub charts: DynChartRenderer,
}

impl Toolkit {
    pub fn new(search: DynWebSearch) -> Self {
        Self {
            search,
            code: Arc::new(DryRunRunner),
            charts: Arc::new(PlannedCharts),
        }
    }

    pub fn with_code_runner(mut self, runner: DynCodeRunner) -> Self {
        self.code = runner;
        self
    }
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::new(Arc::new(PlaceholderSearch))
    }
}
