use bitflags::bitflags;

bitflags! {
    /// The shadow byte stored in every image header.
    ///
    /// Only the high bit has a known meaning; the low bits select the shadow
    /// style used by the client and are preserved as-is.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShadowFlags: u8 {
        /// A mask layer follows the primary pixel payload.
        const HAS_MASK = 0x80;

        const _ = !0;
    }
}

impl ShadowFlags {
    /// Whether the record carries a mask layer.
    pub fn has_mask(self) -> bool {
        self.contains(ShadowFlags::HAS_MASK)
    }

    /// The shadow style without the mask bit.
    pub fn shadow_type(self) -> u8 {
        (self - ShadowFlags::HAS_MASK).bits()
    }
}
