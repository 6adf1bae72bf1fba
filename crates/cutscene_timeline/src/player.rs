// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime playback: drives reflectors from a [`PlayData`] one frame per tick.

use crate::element::{ElementId, FrameData};
use crate::keyframe::Frame;
use crate::play_data::PlayData;
use crate::setting::EventFlags;
use indexmap::IndexMap;

/// Applies per-frame element data to something visible or audible
pub trait Reflector {
    /// Called when playback starts, after the reflector has been hidden
    fn initialize_play(&mut self) {}

    /// Show or hide the reflected object
    fn set_active(&mut self, active: bool);

    /// Apply one frame. Returns false to hold playback on this frame.
    fn reflect(&mut self, data: &FrameData) -> bool;
}

impl<R: Reflector + ?Sized> Reflector for Box<R> {
    fn initialize_play(&mut self) {
        (**self).initialize_play();
    }

    fn set_active(&mut self, active: bool) {
        (**self).set_active(active);
    }

    fn reflect(&mut self, data: &FrameData) -> bool {
        (**self).reflect(data)
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

struct Binding<R> {
    reflector: R,
    active: bool,
}

impl<R: Reflector> Binding<R> {
    fn reset(&mut self) {
        self.active = false;
        self.reflector.set_active(false);
        self.reflector.initialize_play();
    }
}

/// Plays a document through bound reflectors
pub struct Player<R: Reflector = Box<dyn Reflector>> {
    bindings: IndexMap<ElementId, Binding<R>>,
    frame: Frame,
    state: PlaybackState,
    flags: EventFlags,
}

impl<R: Reflector> Player<R> {
    /// Create an idle player with no reflectors
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
            frame: 0,
            state: PlaybackState::Stopped,
            flags: EventFlags::empty(),
        }
    }

    /// Attach a reflector to an element. Replaces any previous binding.
    pub fn bind(&mut self, element: ElementId, reflector: R) {
        let mut binding = Binding {
            reflector,
            active: false,
        };
        binding.reset();
        self.bindings.insert(element, binding);
    }

    /// Detach the reflector of an element
    pub fn unbind(&mut self, element: ElementId) -> Option<R> {
        self.bindings
            .shift_remove(&element)
            .map(|binding| binding.reflector)
    }

    /// Get a bound reflector
    pub fn reflector(&self, element: ElementId) -> Option<&R> {
        self.bindings.get(&element).map(|binding| &binding.reflector)
    }

    /// Number of bound reflectors
    pub fn reflector_count(&self) -> usize {
        self.bindings.len()
    }

    /// Start from frame 0 with no flags raised
    pub fn play(&mut self) {
        self.frame = 0;
        self.flags = EventFlags::empty();
        self.state = PlaybackState::Playing;
        for binding in self.bindings.values_mut() {
            binding.reset();
        }
        tracing::debug!("Playback started with {} reflectors", self.bindings.len());
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume paused playback
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop playback, keeping the current frame
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current frame
    pub fn current_frame(&self) -> Frame {
        self.frame
    }

    /// Flags raised so far
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Raise flags (e.g. from a picked choice)
    pub fn set_flag(&mut self, flags: EventFlags) {
        self.flags |= flags;
    }

    /// Advance one tick. The frame only moves once every reflector is done with it.
    pub fn update(&mut self, data: &PlayData) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if !self.apply(data) {
            return;
        }
        self.frame = self.frame.saturating_add(1);
        if self.frame >= data.total_frames() {
            self.frame = data.total_frames();
            self.state = PlaybackState::Stopped;
            tracing::debug!("Playback finished at frame {}", self.frame);
        }
    }

    /// Jump to a frame and apply it without advancing
    pub fn seek(&mut self, data: &PlayData, frame: Frame) {
        self.frame = frame;
        self.apply(data);
    }

    /// Reflect the current frame. Returns whether every reflector completed.
    fn apply(&mut self, data: &PlayData) -> bool {
        let playing = self.state == PlaybackState::Playing;
        let mut complete = true;
        for (id, binding) in &mut self.bindings {
            let Some(element) = data.element(*id) else {
                continue;
            };

            // Flagged elements only show once the player shares a flag with them
            let gate = element.flags();
            if !gate.is_empty() && !gate.intersects(self.flags) {
                if !playing && binding.active {
                    binding.active = false;
                    binding.reflector.set_active(false);
                }
                continue;
            }

            let frame_data = element.frame_data(self.frame);
            if frame_data.is_active != binding.active {
                binding.active = frame_data.is_active;
                binding.reflector.set_active(binding.active);
            }
            if !binding.reflector.reflect(&frame_data) {
                complete = false;
            }
        }
        complete
    }
}

impl<R: Reflector> Default for Player<R> {
    fn default() -> Self {
        Self::new()
    }
}
