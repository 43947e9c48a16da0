//! Movement intent: which directional keys are held, plus the camera heading.
//!
//! Intent is stored as a bitmask so a frame's input is a single small `Copy` value
//! that is cheap to record, replay and compare.

use num_traits::{One, PrimInt};

use crate::{
    collision::types::Vec2,
    utils::{forward_from_yaw, right_from_yaw},
};

/// Trait implemented by flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index; the backing
/// integer is chosen through `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Set of flags backed by a primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T> + Copy>(flags: &[U]) -> Self {
        let mut out = Self::new(T::zero());
        out.add_many(flags);
        out
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits | flag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits & !flag.mask();
    }

    pub fn set<U: FlagBitmask<Storage = T>>(&mut self, flag: U, on: bool) {
        if on {
            self.add(flag);
        } else {
            self.remove(flag);
        }
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, flag: U) -> bool {
        (self.bits & flag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, flags: &[U]) {
        for &flag in flags {
            self.add(flag);
        }
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, flags: &[U]) -> bool {
        let combined = flags.iter().fold(T::zero(), |acc, f| acc | f.mask());
        (self.bits & combined) != T::zero()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a bitmask-backed enum and implement [`FlagBitmask`] for it.
#[macro_export]
macro_rules! define_bitmask_flags {
    ($(#[$meta:meta])* $name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::intent::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(
    /// Keys a player can hold to move the avatar.
    MoveIntent, u8, {
        Forward,
        Backward,
        Left,
        Right,
        Sprint,
        Jump,
    }
);

const DIRECTIONAL: [MoveIntent; 4] = [
    MoveIntent::Forward,
    MoveIntent::Backward,
    MoveIntent::Left,
    MoveIntent::Right,
];

/// One frame of input for the character controller.
///
/// `heading` is the camera yaw in radians (same convention as `facing`); intent
/// directions are relative to it.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct MoveInput {
    pub intent: BitmaskFlags<u8>,
    pub heading: f32,
}

impl MoveInput {
    pub fn new(heading: f32) -> Self {
        Self {
            intent: BitmaskFlags::default(),
            heading,
        }
    }

    /// No keys held.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: MoveIntent) -> Self {
        self.intent.add(flag);
        self
    }

    #[inline]
    pub fn has(&self, flag: MoveIntent) -> bool {
        self.intent.has(flag)
    }

    #[inline]
    pub fn sprint(&self) -> bool {
        self.has(MoveIntent::Sprint)
    }

    #[inline]
    pub fn jump(&self) -> bool {
        self.has(MoveIntent::Jump)
    }

    #[inline]
    pub fn is_directional(&self) -> bool {
        self.intent.has_any(&DIRECTIONAL)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.heading.is_finite()
    }

    /// Unit world-space (x, z) direction the player asks for, or `None` when no
    /// directional key is held or opposing keys cancel out.
    ///
    /// Diagonals are normalised, so holding two keys is not faster than one.
    pub fn wish_direction(&self) -> Option<Vec2> {
        let axis = |pos: MoveIntent, neg: MoveIntent| -> f32 {
            self.has(pos) as i8 as f32 - self.has(neg) as i8 as f32
        };
        let fwd = axis(MoveIntent::Forward, MoveIntent::Backward);
        let strafe = axis(MoveIntent::Right, MoveIntent::Left);
        if fwd == 0.0 && strafe == 0.0 {
            return None;
        }
        let dir = forward_from_yaw(self.heading) * fwd + right_from_yaw(self.heading) * strafe;
        let len = dir.norm();
        (len.is_finite() && len > 0.0).then(|| dir / len)
    }
}
