// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::ops::BitOr;

use nvg_encoding::{Paint, Scissor, Transform};
use peniko::kurbo::{Cap, Join};
use peniko::Color;

/// Maximum depth of the state stack.
pub const MAX_STATES: usize = 32;

/// Horizontal and vertical text alignment flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextAlign(pub u32);

impl TextAlign {
    pub const LEFT: Self = Self(1 << 0);
    pub const CENTER: Self = Self(1 << 1);
    pub const RIGHT: Self = Self(1 << 2);
    pub const TOP: Self = Self(1 << 3);
    pub const MIDDLE: Self = Self(1 << 4);
    pub const BOTTOM: Self = Self(1 << 5);
    pub const BASELINE: Self = Self(1 << 6);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for TextAlign {
    fn default() -> Self {
        Self::LEFT | Self::BASELINE
    }
}

impl BitOr for TextAlign {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Text style carried by the state stack.
///
/// Glyph shaping happens outside the context; these values are kept so that
/// a text layer can read them back from the active state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub letter_spacing: f32,
    pub line_height: f32,
    pub blur: f32,
    pub align: TextAlign,
    pub font_id: Option<u32>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            letter_spacing: 0.0,
            line_height: 0.0,
            blur: 0.0,
            align: TextAlign::default(),
            font_id: None,
        }
    }
}

/// Render state saved and restored by the state stack.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawState {
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: f32,
    pub miter_limit: f32,
    pub line_cap: Cap,
    pub line_join: Join,
    pub global_alpha: f32,
    pub transform: Transform,
    pub scissor: Scissor,
    pub text: TextStyle,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: Paint::Solid(Color::WHITE),
            stroke: Paint::Solid(Color::BLACK),
            stroke_width: 1.0,
            miter_limit: 10.0,
            line_cap: Cap::Butt,
            line_join: Join::Miter,
            global_alpha: 1.0,
            transform: Transform::IDENTITY,
            scissor: Scissor::DISABLED,
            text: TextStyle::default(),
        }
    }
}

/// Bounded stack of [`DrawState`]s. Never empty.
#[derive(Clone, Debug)]
pub struct StateStack {
    states: Vec<DrawState>,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStack {
    pub fn new() -> Self {
        let mut states = Vec::with_capacity(MAX_STATES);
        states.push(DrawState::default());
        Self { states }
    }

    pub fn current(&self) -> &DrawState {
        // The stack always holds at least one state.
        &self.states[self.states.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut DrawState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    /// Pushes a copy of the current state. Does nothing when full.
    pub fn save(&mut self) {
        if self.states.len() >= MAX_STATES {
            return;
        }
        let top = *self.current();
        self.states.push(top);
    }

    /// Pops the current state. The bottom state is never popped.
    pub fn restore(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    /// Resets the current state to defaults.
    pub fn reset(&mut self) {
        *self.current_mut() = DrawState::default();
    }

    /// Drops every state and starts over with a single default state.
    pub fn clear(&mut self) {
        self.states.truncate(1);
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use nvg_encoding::Transform;

    use super::{StateStack, MAX_STATES};

    #[test]
    fn save_past_limit_is_noop() {
        let mut stack = StateStack::new();
        for _ in 0..MAX_STATES + 5 {
            stack.save();
        }
        assert_eq!(stack.depth(), MAX_STATES);
    }

    #[test]
    fn restore_keeps_bottom_state() {
        let mut stack = StateStack::new();
        stack.current_mut().stroke_width = 3.0;
        stack.restore();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().stroke_width, 3.0);
    }

    #[test]
    fn save_restore_round_trip() {
        let mut stack = StateStack::new();
        stack.current_mut().transform = Transform::rotate(0.3);
        let before = *stack.current();
        stack.save();
        stack.current_mut().transform = Transform::scale(4.0, 4.0);
        stack.current_mut().global_alpha = 0.5;
        stack.restore();
        assert_eq!(*stack.current(), before);
    }
}
