//! 核心宏定义
//!
//! 配置结构体的默认值统一通过宏声明

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use soft_particles::impl_default;
///
/// struct FadeSettings {
///     margin: f32,
///     steepness: f32,
/// }
///
/// impl_default!(FadeSettings {
///     margin: 0.015,
///     steepness: 120.0,
/// });
///
/// let settings = FadeSettings::default();
/// assert_eq!(settings.steepness, 120.0);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
