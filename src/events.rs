/// Observable notifications emitted by the engine, one per completed or
/// failed transition. Hosts subscribe to log, surface errors, or drive UI
/// chrome; dropping the receiver never blocks the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// A transition committed: `index` is now the fully visible slide.
    SlideShown {
        index: usize,
        url: String,
        link: Option<String>,
    },
    /// A preload failed; the previously visible slide is still showing.
    LoadFailed {
        index: usize,
        url: String,
        error: String,
    },
}
