use std::fmt;

/// 图片像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 宽或高任意一边低于阈值即为低分辨率
    pub fn is_low_res(&self, threshold: u32) -> bool {
        self.width < threshold || self.height < threshold
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
