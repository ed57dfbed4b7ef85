//! Screen context and host loop.
//!
//! [`Screen`] bundles everything one terminal session needs: the node tree,
//! the focus manager, the single screen buffer, colour resolution, global
//! key bindings and refresh timers. Nothing here is global.
//!
//! ```ignore
//! let mut screen = Screen::new(80, 24, Box::new(Palette::default_dark()));
//! let root = primitives::panel(screen.tree_mut(), PanelProps::default());
//! screen.tree_mut().set_root(root)?;
//! screen.run()?; // blocks until Ctrl+C / Ctrl+Q
//! ```

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{NodeId, UiTree};
use crate::renderer::{DiffRenderer, ScreenBuffer};
use crate::state::keyboard::{self, InputEvent};
use crate::state::{handle_input, FocusManager, GlobalAction, GlobalBindings, RefreshTimer};
use crate::theme::ColorResolver;

use super::render::render;

/// Poll timeout of the host loop (~60 fps).
const POLL_INTERVAL: Duration = Duration::from_millis(16);

struct TimerBinding {
    timer: RefreshTimer,
    /// Nodes refreshed on a tick; empty means every node.
    targets: Vec<NodeId>,
}

/// One terminal session.
pub struct Screen {
    tree: UiTree,
    focus: FocusManager,
    buffer: ScreenBuffer,
    colors: Box<dyn ColorResolver>,
    bindings: GlobalBindings,
    timers: Vec<TimerBinding>,
    running: Arc<AtomicBool>,
}

impl Screen {
    pub fn new(width: u16, height: u16, colors: Box<dyn ColorResolver>) -> Self {
        Self {
            tree: UiTree::new(),
            focus: FocusManager::new(),
            buffer: ScreenBuffer::new(width, height),
            colors,
            bindings: GlobalBindings::default(),
            timers: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_bindings(mut self, bindings: GlobalBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut UiTree {
        &mut self.tree
    }

    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    /// Tree and focus manager together, for focus operations.
    pub fn parts_mut(&mut self) -> (&mut UiTree, &mut FocusManager) {
        (&mut self.tree, &mut self.focus)
    }

    /// The last painted frame.
    pub fn buffer(&self) -> &ScreenBuffer {
        &self.buffer
    }

    /// Refresh `targets` (or every node when empty) on each tick.
    pub fn add_timer(&mut self, timer: RefreshTimer, targets: Vec<NodeId>) {
        debug!(timer = %timer.name(), targets = targets.len(), "timer attached");
        self.timers.push(TimerBinding { timer, targets });
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the loop to exit after the current step.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Shared flag for stopping the loop from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Process at most one event, run due refreshes, then paint.
    ///
    /// Returns whether the loop should keep running.
    pub fn step(&mut self, event: Option<InputEvent>) -> bool {
        match event {
            Some(InputEvent::Key(key)) => {
                if !handle_input(&mut self.tree, &mut self.focus, &key).is_handled() {
                    if let Some(action) = self.bindings.lookup(&key) {
                        self.apply_action(action);
                    }
                }
            }
            Some(InputEvent::Resize(width, height)) => self.resize(width, height),
            Some(InputEvent::None) | None => {}
        }

        self.poll_timers();
        render(&mut self.tree, &mut self.buffer, self.colors.as_ref());
        self.is_running()
    }

    /// Resize the buffer and force the root to the new screen size.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.buffer.resize(width, height);
        if let Some(root) = self.tree.root() {
            if let Err(err) = self.tree.set_bounds(root, self.buffer.bounds()) {
                warn!(op = "resize", error = %err, "could not resize root");
            }
        }
        self.tree.request_redraw();
    }

    fn apply_action(&mut self, action: GlobalAction) {
        debug!(?action, "global action");
        match action {
            GlobalAction::Quit => self.stop(),
            GlobalAction::Refresh => self.refresh(&[]),
            GlobalAction::FocusNext => {
                self.focus.rebuild(&self.tree);
                self.focus.next(&mut self.tree);
            }
            GlobalAction::FocusPrevious => {
                self.focus.rebuild(&self.tree);
                self.focus.previous(&mut self.tree);
            }
        }
    }

    fn poll_timers(&mut self) {
        let due: Vec<Vec<NodeId>> = self
            .timers
            .iter()
            .filter(|binding| binding.timer.take())
            .map(|binding| binding.targets.clone())
            .collect();
        for targets in due {
            self.refresh(&targets);
        }
    }

    /// Call `Widget::refresh` on `targets`, or on every node when empty.
    /// Failures are logged per node.
    pub fn refresh(&mut self, targets: &[NodeId]) {
        for (id, node) in self.tree.iter_mut() {
            if !targets.is_empty() && !targets.contains(&id) {
                continue;
            }
            if let Err(err) = node.widget_mut().refresh() {
                warn!(node = %node.name(), op = "refresh", error = %err, "refresh failed");
            }
        }
        self.tree.request_redraw();
    }

    /// Blocking host loop on stdout: fullscreen, poll, step, flush diffs.
    pub fn run(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        let mut renderer = DiffRenderer::new();
        renderer.enter_fullscreen(&mut stdout)?;

        let (width, height) = crossterm::terminal::size()?;
        self.resize(width, height);
        self.focus.rebuild(&self.tree);
        if self.focus.focused().is_none() {
            self.focus.focus_first(&mut self.tree);
        }
        info!(width, height, "screen mounted");

        let result = self.event_loop(&mut stdout, &mut renderer);
        let restored = renderer.exit_fullscreen(&mut stdout);
        self.teardown();
        result.and(restored)
    }

    fn event_loop<W: Write>(&mut self, out: &mut W, renderer: &mut DiffRenderer) -> io::Result<()> {
        self.step(None);
        renderer.render_full(out, &self.buffer)?;
        while self.is_running() {
            let event = keyboard::poll_event(POLL_INTERVAL)?;
            if matches!(event, Some(InputEvent::Resize(..))) {
                renderer.invalidate();
            }
            if !self.step(event) {
                break;
            }
            renderer.render(out, &self.buffer)?;
        }
        Ok(())
    }

    /// Stop timers, drop every node and mark the screen stopped.
    pub fn teardown(&mut self) {
        for binding in &mut self.timers {
            binding.timer.stop();
        }
        self.timers.clear();
        self.tree.clear();
        self.focus = FocusManager::new();
        self.stop();
        debug!("screen torn down");
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        for binding in &mut self.timers {
            binding.timer.stop();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Node, PanelWidget, RenderFrame, Widget};
    use crate::error::{Error, Result};
    use crate::layout::LayoutProps;
    use crate::state::keyboard::{KeyboardEvent, Modifiers};
    use crate::theme::Palette;
    use crate::types::Rect;

    #[derive(Default)]
    struct Counter {
        refreshed: u32,
        fail: bool,
    }

    impl Widget for Counter {
        fn kind(&self) -> &'static str {
            "counter"
        }

        fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
            let text = self.refreshed.to_string();
            frame.write(0, 0, &text, frame.text_style());
            Ok(())
        }

        fn refresh(&mut self) -> Result<()> {
            if self.fail {
                return Err(Error::Data("source offline".into()));
            }
            self.refreshed += 1;
            Ok(())
        }
    }

    fn screen() -> (Screen, NodeId, NodeId) {
        let mut screen = Screen::new(10, 2, Box::new(Palette::new()));
        let tree = screen.tree_mut();
        let root = tree.insert(Node::panel("root", Box::new(PanelWidget), None).with_bounds(Rect::new(0, 0, 10, 2)));
        tree.set_root(root).unwrap();
        let a = tree.insert(Node::new("a", Box::<Counter>::default()).with_bounds(Rect::new(0, 0, 5, 1)).focusable(true));
        let b = tree.insert(Node::new("b", Box::<Counter>::default()).with_bounds(Rect::new(0, 1, 5, 1)).focusable(true));
        tree.add_child(root, a, LayoutProps::default()).unwrap();
        tree.add_child(root, b, LayoutProps::default()).unwrap();
        (screen, a, b)
    }

    #[test]
    fn test_step_renders_frame() {
        let (mut screen, _, _) = screen();
        assert!(screen.step(None));
        assert!(screen.buffer().row_text(0).starts_with('0'));
    }

    #[test]
    fn test_quit_binding_stops_loop() {
        let (mut screen, _, _) = screen();
        let ctrl_c = KeyboardEvent::with_modifiers("c", Modifiers::ctrl());
        assert!(!screen.step(Some(InputEvent::Key(ctrl_c))));
        assert!(!screen.is_running());
    }

    #[test]
    fn test_tab_cycles_focus() {
        let (mut screen, a, b) = screen();
        let tab = || Some(InputEvent::Key(KeyboardEvent::new("Tab")));
        screen.step(tab());
        assert_eq!(screen.focus().focused(), Some(a));
        screen.step(tab());
        assert_eq!(screen.focus().focused(), Some(b));
        screen.step(tab());
        assert_eq!(screen.focus().focused(), Some(a));
    }

    #[test]
    fn test_refresh_key_refreshes_all_and_isolates_failures() {
        let (mut screen, a, b) = screen();
        screen.tree_mut().widget_mut::<Counter>(a).unwrap().fail = true;
        screen.step(Some(InputEvent::Key(KeyboardEvent::new("F5"))));
        assert_eq!(screen.tree().widget::<Counter>(a).unwrap().refreshed, 0);
        assert_eq!(screen.tree().widget::<Counter>(b).unwrap().refreshed, 1);
        assert!(screen.buffer().row_text(1).starts_with('1'));
    }

    #[test]
    fn test_timer_refreshes_targets_only() {
        let (mut screen, a, b) = screen();
        let timer = RefreshTimer::start("test", Duration::from_secs(60));
        timer.request();
        screen.add_timer(timer, vec![b]);
        screen.step(None);
        assert_eq!(screen.tree().widget::<Counter>(a).unwrap().refreshed, 0);
        assert_eq!(screen.tree().widget::<Counter>(b).unwrap().refreshed, 1);
        // Flag consumed.
        screen.step(None);
        assert_eq!(screen.tree().widget::<Counter>(b).unwrap().refreshed, 1);
    }

    #[test]
    fn test_resize_updates_root_bounds() {
        let (mut screen, _, _) = screen();
        screen.step(Some(InputEvent::Resize(30, 8)));
        let root = screen.tree().root().unwrap();
        assert_eq!(screen.tree().get(root).unwrap().bounds(), Rect::new(0, 0, 30, 8));
        assert_eq!(screen.buffer().width(), 30);
    }

    #[test]
    fn test_teardown_clears_everything() {
        let (mut screen, _, _) = screen();
        screen.add_timer(RefreshTimer::start("t", Duration::from_secs(60)), Vec::new());
        screen.teardown();
        assert!(screen.tree().is_empty());
        assert!(!screen.is_running());
    }
}
