use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 110, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 190, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 192, g: 192, b: 192 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 120, g: 230, b: 140 };
pub const IPV4_PREFIX: Color = Color::TrueColor { r: 70, g: 160, b: 90 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 200, g: 150, b: 255 };
pub const IPV6_PREFIX: Color = Color::TrueColor { r: 140, g: 100, b: 190 };

pub const GOOD: Color = Color::Green;
pub const WARN: Color = Color::Yellow;
pub const BAD: Color = Color::Red;
