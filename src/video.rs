//! Video: display modes, surfaces and the compositor seam.
//!
//! The renderer owns two surfaces: the *output* (window chrome, the
//! compositor's target) and the *display* (the emulated screen, one of the
//! compositor's inputs). Pixel work happens behind [`VideoBackend`] and
//! [`Compositor`]; this module only models ownership and geometry.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::VideoError;

/// Width of the emulated screen without border.
pub const SCREEN_WIDTH: u32 = 256;
/// Height of the emulated screen without border.
pub const SCREEN_HEIGHT: u32 = 192;
/// Horizontal border on each side.
pub const BORDER_X: u32 = 32;
/// Vertical border above and below.
pub const BORDER_Y: u32 = 32;
/// Full width including border.
pub const TOTAL_SCREEN_WIDTH: u32 = SCREEN_WIDTH + 2 * BORDER_X;
/// Full height including border.
pub const TOTAL_SCREEN_HEIGHT: u32 = SCREEN_HEIGHT + 2 * BORDER_Y;

/// A rectangle of updated pixels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: u16,
    /// Y coordinate of the top-left corner.
    pub y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Get the area in pixels.
    #[inline]
    pub const fn area(&self) -> u32 {
        (self.width as u32) * (self.height as u32)
    }

    /// Check if the rectangle is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({}, {} {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Integer scale applied to the emulated screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScaleTier {
    /// Native resolution.
    #[default]
    X1,
    /// Doubled in both directions.
    X2,
}

impl ScaleTier {
    /// Multiplier for this tier.
    pub const fn factor(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
        }
    }
}

/// Requested display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayMode {
    /// Requested scale tier.
    pub scale: ScaleTier,
    /// Fullscreen output.
    pub fullscreen: bool,
}

impl DisplayMode {
    /// Create a display mode.
    pub const fn new(scale: ScaleTier, fullscreen: bool) -> Self {
        Self { scale, fullscreen }
    }

    /// Scale actually used: fullscreen forces 2x.
    pub const fn effective_scale(self) -> ScaleTier {
        if self.fullscreen {
            ScaleTier::X2
        } else {
            self.scale
        }
    }

    /// Output size in pixels.
    pub const fn dimensions(self) -> (u32, u32) {
        let factor = self.effective_scale().factor();
        (TOTAL_SCREEN_WIDTH * factor, TOTAL_SCREEN_HEIGHT * factor)
    }
}

/// Move the console overlay so it keeps its place relative to the bottom
/// edge when the output height changes from `old_height` to the height of
/// `to`. The distance from the bottom edge scales with the tier.
///
/// Offsets outside the old output saturate instead of overflowing.
pub fn rescale_console_offset(offset: i32, old_height: u32, to: ScaleTier) -> i32 {
    let height = i32::try_from(old_height).unwrap_or(i32::MAX);
    let from_bottom = height.saturating_sub(offset);
    match to {
        ScaleTier::X2 => height.saturating_mul(2).saturating_sub(from_bottom.saturating_mul(2)),
        ScaleTier::X1 => height / 2 - from_bottom / 2,
    }
}

/// Which slot a surface fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    /// The window surface the compositor draws into.
    Output,
    /// The emulated screen composited onto the output.
    Display,
}

/// Backend-assigned surface identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// A rendering target owned by the renderer actor.
///
/// Surfaces are not `Clone`: exactly one owner exists until the surface is
/// handed back to [`VideoBackend::release`].
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    role: SurfaceRole,
    width: u32,
    height: u32,
    updates: Option<Receiver<Vec<Rect>>>,
}

impl Surface {
    /// Create a surface without an update stream.
    pub const fn new(id: SurfaceId, role: SurfaceRole, width: u32, height: u32) -> Self {
        Self {
            id,
            role,
            width,
            height,
            updates: None,
        }
    }

    /// Attach the stream of updated regions.
    #[must_use]
    pub fn with_updates(mut self, updates: Receiver<Vec<Rect>>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Surface identity.
    pub const fn id(&self) -> SurfaceId {
        self.id
    }

    /// Surface role.
    pub const fn role(&self) -> SurfaceRole {
        self.role
    }

    /// Width in pixels.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Updated-region notifications, if the surface produces them.
    pub fn updates(&self) -> Option<Receiver<Vec<Rect>>> {
        self.updates.clone()
    }
}

/// The core-facing end of a display surface.
#[derive(Debug, Clone)]
pub struct DisplaySink {
    surface: SurfaceId,
    width: u32,
    height: u32,
    updates: Sender<Vec<Rect>>,
}

impl DisplaySink {
    /// Create a display surface and its matching sink.
    pub fn pair(id: SurfaceId, width: u32, height: u32) -> (Surface, Self) {
        let (tx, rx) = bounded(16);
        let surface = Surface::new(id, SurfaceRole::Display, width, height).with_updates(rx);
        let sink = Self {
            surface: id,
            width,
            height,
            updates: tx,
        };
        (surface, sink)
    }

    /// The surface this sink writes to.
    pub const fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Sink size in pixels.
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Report updated regions. Returns `false` once the surface is gone.
    ///
    /// A notification that finds the stream full is dropped; the compositor
    /// repaints from the surface anyway.
    pub fn notify(&self, rects: Vec<Rect>) -> bool {
        !matches!(
            self.updates.try_send(rects),
            Err(TrySendError::Disconnected(_))
        )
    }
}

/// Allocates and frees surfaces.
pub trait VideoBackend: Send + Sync {
    /// Set the video mode and return the new output surface.
    fn open_output(&self, mode: DisplayMode) -> Result<Surface, VideoError>;

    /// Create a display surface and the sink the core draws into.
    fn open_display(&self, mode: DisplayMode) -> Result<(Surface, DisplaySink), VideoError>;

    /// Free a superseded surface.
    fn release(&self, surface: Surface);

    /// Shut the backend down once every actor has exited.
    fn shutdown(&self) {}
}

/// The surface compositor.
///
/// Methods documented as blocking return only after the compositor has
/// acknowledged the change.
pub trait Compositor: Send + Sync {
    /// Register a display surface as a compositing input at `(x, y)`.
    fn add_input_surface(&self, surface: &Surface, x: i32, y: i32);

    /// Drop every input registration. Blocking.
    fn remove_all_input_surfaces(&self);

    /// Set or clear the output surface. Blocking.
    fn replace_output_surface(&self, surface: Option<&Surface>);

    /// Toggle highlighting of painted regions.
    fn show_painted_regions(&self, enable: bool);
}

/// Commands understood by a compositor running as its own actor.
#[derive(Debug)]
pub enum CompositorCommand {
    /// Register an input surface.
    AddInputSurface {
        /// Surface identity.
        surface: SurfaceId,
        /// Horizontal placement.
        x: i32,
        /// Vertical placement.
        y: i32,
        /// Updated-region notifications.
        updates: Option<Receiver<Vec<Rect>>>,
    },
    /// Drop every input registration, then ack.
    RemoveAllInputSurfaces(Sender<()>),
    /// Set or clear the output surface, then ack.
    ReplaceOutputSurface {
        /// New output, `None` to detach.
        surface: Option<(SurfaceId, u32, u32)>,
        /// Acknowledgment.
        done: Sender<()>,
    },
    /// Toggle painted-region highlighting.
    ShowPaintedRegions(bool),
}

/// [`Compositor`] that forwards to a compositor actor over a channel.
///
/// If the compositor has gone away the blocking calls return immediately;
/// its registrations died with it.
#[derive(Debug, Clone)]
pub struct CompositorClient {
    sender: Sender<CompositorCommand>,
}

impl CompositorClient {
    /// Wrap the compositor actor's command sender.
    pub const fn new(sender: Sender<CompositorCommand>) -> Self {
        Self { sender }
    }

    fn round_trip(&self, build: impl FnOnce(Sender<()>) -> CompositorCommand) {
        let (done, ack) = bounded(1);
        if self.sender.send(build(done)).is_ok() {
            let _ = ack.recv();
        }
    }
}

impl Compositor for CompositorClient {
    fn add_input_surface(&self, surface: &Surface, x: i32, y: i32) {
        let _ = self.sender.send(CompositorCommand::AddInputSurface {
            surface: surface.id(),
            x,
            y,
            updates: surface.updates(),
        });
    }

    fn remove_all_input_surfaces(&self) {
        self.round_trip(CompositorCommand::RemoveAllInputSurfaces);
    }

    fn replace_output_surface(&self, surface: Option<&Surface>) {
        let surface = surface.map(|s| (s.id(), s.width(), s.height()));
        self.round_trip(|done| CompositorCommand::ReplaceOutputSurface { surface, done });
    }

    fn show_painted_regions(&self, enable: bool) {
        let _ = self.sender.send(CompositorCommand::ShowPaintedRegions(enable));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fullscreen_forces_2x() {
        let mode = DisplayMode::new(ScaleTier::X1, true);
        assert_eq!(mode.effective_scale(), ScaleTier::X2);
        assert_eq!(mode.dimensions(), (640, 512));
        assert_eq!(DisplayMode::default().dimensions(), (320, 256));
    }

    #[test]
    fn test_console_offset_scales_with_tier() {
        // 40px above the bottom at 1x becomes 80px above the bottom at 2x.
        let up = rescale_console_offset(216, 256, ScaleTier::X2);
        assert_eq!(up, 432);
        assert_eq!(512 - up, 80);

        let down = rescale_console_offset(up, 512, ScaleTier::X1);
        assert_eq!(down, 216);
    }

    #[test]
    fn test_console_offset_extremes_saturate() {
        assert_eq!(rescale_console_offset(i32::MIN, 256, ScaleTier::X2), 512 - i32::MAX);
        assert_eq!(rescale_console_offset(i32::MAX, 256, ScaleTier::X2), i32::MAX);
        assert_eq!(rescale_console_offset(i32::MIN, 512, ScaleTier::X1), 256 - i32::MAX / 2);
        assert_eq!(rescale_console_offset(i32::MAX, 512, ScaleTier::X1), 256 - (512 - i32::MAX) / 2);
    }

    #[test]
    fn test_sink_notifies_surface() {
        let (surface, sink) = DisplaySink::pair(SurfaceId(7), 320, 256);
        assert_eq!(surface.role(), SurfaceRole::Display);
        assert_eq!(sink.surface(), SurfaceId(7));

        assert!(sink.notify(vec![Rect::new(0, 0, 8, 8)]));
        let rects = surface.updates().unwrap().try_recv().unwrap();
        assert_eq!(rects[0].area(), 64);

        drop(surface);
        assert!(!sink.notify(vec![Rect::new(0, 0, 1, 1)]));
    }

    #[test]
    fn test_client_blocks_for_ack() {
        let (tx, rx) = bounded(4);
        let client = CompositorClient::new(tx);

        let compositor = thread::spawn(move || {
            let mut seen = Vec::new();
            while let Ok(cmd) = rx.recv() {
                match cmd {
                    CompositorCommand::RemoveAllInputSurfaces(done) => {
                        seen.push("remove");
                        done.send(()).unwrap();
                    }
                    CompositorCommand::ReplaceOutputSurface { surface, done } => {
                        seen.push(if surface.is_some() { "output" } else { "detach" });
                        done.send(()).unwrap();
                    }
                    CompositorCommand::AddInputSurface { .. } => seen.push("add"),
                    CompositorCommand::ShowPaintedRegions(_) => seen.push("paint"),
                }
            }
            seen
        });

        let output = Surface::new(SurfaceId(1), SurfaceRole::Output, 320, 256);
        let (display, _sink) = DisplaySink::pair(SurfaceId(2), 320, 256);
        client.replace_output_surface(None);
        client.replace_output_surface(Some(&output));
        client.remove_all_input_surfaces();
        client.add_input_surface(&display, 0, 0);
        client.show_painted_regions(true);
        drop(client);

        assert_eq!(
            compositor.join().unwrap(),
            vec!["detach", "output", "remove", "add", "paint"]
        );
    }
}
