use wgpu::{Device, Texture, TextureFormat, TextureUsages, TextureView};

/// 渲染目标尺寸
///
/// 所有离屏目标都通过它判断是否需要重新分配。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    /// 创建尺寸，宽高至少为 1
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// 更新尺寸，返回是否发生变化
    pub fn update(&mut self, width: u32, height: u32) -> bool {
        let next = Self::new(width, height);
        if *self == next {
            return false;
        }
        *self = next;
        true
    }

    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    pub fn as_vec2(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// 离屏渲染目标
pub struct OffscreenTarget {
    /// 纹理
    pub texture: Texture,
    /// 纹理视图
    pub view: TextureView,
    /// 尺寸
    pub size: TargetSize,
    /// 格式
    pub format: TextureFormat,
    label: &'static str,
}

impl OffscreenTarget {
    /// 创建新的离屏渲染目标
    pub fn new(
        device: &Device,
        label: &'static str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        let size = TargetSize::new(width, height);
        let texture = create_color_texture(device, label, size, format);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            size,
            format,
            label,
        }
    }

    /// 调整大小，返回是否重新分配
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) -> bool {
        if !self.size.update(width, height) {
            return false;
        }

        self.texture = create_color_texture(device, self.label, self.size, self.format);
        self.view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        true
    }
}

fn create_color_texture(
    device: &Device,
    label: &str,
    size: TargetSize,
    format: TextureFormat,
) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: size.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}
