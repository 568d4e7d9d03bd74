//! 粒子精灵纹理

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::core::error::{AssetError, AssetResult};

/// 程序生成精灵的默认边长
pub const PROCEDURAL_SPRITE_SIZE: u32 = 64;

/// 从文件加载精灵
pub fn load_sprite(path: &Path) -> AssetResult<RgbaImage> {
    if !path.exists() {
        return Err(AssetError::NotFound {
            path: path.display().to_string(),
        });
    }
    let img = image::open(path).map_err(|e| AssetError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgba8())
}

/// 加载精灵，失败时退回程序生成的烟雾团
pub fn load_sprite_or_procedural(path: Option<&Path>) -> RgbaImage {
    let Some(path) = path else {
        return procedural_puff(PROCEDURAL_SPRITE_SIZE);
    };
    match load_sprite(path) {
        Ok(img) => {
            tracing::info!(
                target: "particles",
                "Loaded sprite {:?} ({}x{})",
                path,
                img.width(),
                img.height()
            );
            img
        }
        Err(e) => {
            tracing::warn!(target: "particles", "{}, using procedural sprite", e);
            procedural_puff(PROCEDURAL_SPRITE_SIZE)
        }
    }
}

/// 中心不透明、向边缘平滑衰减的白色圆斑
pub fn procedural_puff(size: u32) -> RgbaImage {
    let size = size.max(1);
    let centre = (size as f32 - 1.0) * 0.5;
    let radius = (size as f32 * 0.5).max(0.5);
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = (x as f32 - centre) / radius;
        let dy = (y as f32 - centre) / radius;
        let r = (dx * dx + dy * dy).sqrt().min(1.0);
        let falloff = 1.0 - r;
        let alpha = falloff * falloff * (3.0 - 2.0 * falloff);
        Rgba([255, 255, 255, (alpha * 255.0).round() as u8])
    })
}

/// 上传精灵纹理
pub fn upload_sprite(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    rgba: &RgbaImage,
) -> (wgpu::Texture, wgpu::TextureView) {
    let (w, h) = rgba.dimensions();
    let size = wgpu::Extent3d {
        width: w,
        height: h,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Particle Sprite"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_puff_falloff() {
        let img = procedural_puff(64);
        assert_eq!(img.dimensions(), (64, 64));
        let centre = img.get_pixel(32, 32)[3];
        let corner = img.get_pixel(0, 0)[3];
        assert!(centre > 200);
        assert_eq!(corner, 0);
    }

    #[test]
    fn test_missing_sprite_reports_not_found() {
        let result = load_sprite(Path::new("does/not/exist.png"));
        assert!(matches!(result, Err(AssetError::NotFound { .. })));
    }

    #[test]
    fn test_fallback_on_missing_file() {
        let img = load_sprite_or_procedural(Some(Path::new("does/not/exist.png")));
        assert_eq!(img.dimensions(), (PROCEDURAL_SPRITE_SIZE, PROCEDURAL_SPRITE_SIZE));
    }

    #[test]
    fn test_round_trip_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("puff.png");
        procedural_puff(16).save(&path).unwrap();
        let loaded = load_sprite(&path).unwrap();
        assert_eq!(loaded.dimensions(), (16, 16));
    }

    #[test]
    fn test_corrupt_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(
            load_sprite(&path),
            Err(AssetError::LoadFailed { .. })
        ));
    }
}
