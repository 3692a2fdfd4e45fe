//! Predefined anatomical spaces.
//!
//! Native spaces describe a single subject's scanner frames; the template
//! spaces are the usual population atlases. For multi-subject work, define
//! one space type per subject and modality rather than reusing these.

use crate::space::Space;

macro_rules! define_spaces {
    ($($(#[$meta:meta])* $name:ident => $tag:literal,)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Space for $name {
                const NAME: &'static str = $tag;
            }
        )+
    };
}

define_spaces! {
    /// Subject-native T1-weighted frame.
    NativeT1 => "native-t1",
    /// Subject-native T2-weighted frame.
    NativeT2 => "native-t2",
    /// Subject-native proton-density frame.
    NativePd => "native-pd",
    /// Subject-native diffusion frame.
    NativeDwi => "native-dwi",
    /// Subject-native functional frame.
    NativeFmri => "native-fmri",
    /// Subject-native CT frame.
    NativeCt => "native-ct",
    /// Subject-native PET frame.
    NativePet => "native-pet",
    /// MNI152 template space.
    Mni152 => "mni152",
    /// MNI305 template space.
    Mni305 => "mni305",
    /// Talairach template space.
    Talairach => "talairach",
}
