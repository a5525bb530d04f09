pub mod chart_view;

pub use chart_view::ChartView;
