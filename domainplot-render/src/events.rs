/// Notifications fanned out by a [`PlotRenderer`](crate::PlotRenderer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlotEvent {
    /// A render finished uninterrupted and is now the current frame.
    ImageReady { generation: u64 },
    /// The expression or viewport was changed and a new render requested.
    InputChanged,
    /// The cursor moved; readouts should be refreshed.
    CursorMoved { col: f64, row: f64 },
}
