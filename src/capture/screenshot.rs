//! Client-area screenshots through Windows Graphics Capture.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::sync::mpsc;
use std::time::Duration;

use windows::core::Interface;
use windows::Foundation::TypedEventHandler;
use windows::Graphics::Capture::{
    Direct3D11CaptureFrame, Direct3D11CaptureFramePool, GraphicsCaptureItem,
};
use windows::Graphics::DirectX::Direct3D11::IDirect3DDevice;
use windows::Graphics::DirectX::DirectXPixelFormat;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Resource, ID3D11Texture2D,
    D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_MAP_READ, D3D11_SDK_VERSION,
    D3D11_MAPPED_SUBRESOURCE, D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;
use windows::Win32::System::WinRT::Direct3D11::{
    CreateDirect3D11DeviceFromDXGIDevice, IDirect3DDxgiInterfaceAccess,
};
use windows::Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop;
use windows::Win32::System::WinRT::RoGetActivationFactory;

use super::frame::{bgra_to_rgba, ClientCrop};
use super::window::get_client_area_info;

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Hardware D3D11 device plus its WinRT wrapper.
struct CaptureDevice {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    winrt: IDirect3DDevice,
}

impl CaptureDevice {
    fn create() -> Result<Self> {
        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
            .context("D3D11CreateDevice failed")?;
        }
        let device = device.ok_or_else(|| anyhow!("no D3D11 device returned"))?;
        let context = context.ok_or_else(|| anyhow!("no D3D11 context returned"))?;

        let dxgi: IDXGIDevice = device.cast()?;
        let winrt: IDirect3DDevice = unsafe { CreateDirect3D11DeviceFromDXGIDevice(&dxgi)? }
            .cast()
            .context("WinRT device wrapper has an unexpected interface")?;

        Ok(Self {
            device,
            context,
            winrt,
        })
    }

    /// Waits for one frame of `item`.
    fn next_frame(&self, item: &GraphicsCaptureItem) -> Result<Direct3D11CaptureFrame> {
        let pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
            &self.winrt,
            DirectXPixelFormat::B8G8R8A8UIntNormalized,
            1,
            item.Size()?,
        )?;
        let session = pool.CreateCaptureSession(item)?;

        let (tx, rx) = mpsc::channel();
        pool.FrameArrived(&TypedEventHandler::new(
            move |_: &Option<Direct3D11CaptureFramePool>, _| {
                let _ = tx.send(());
                Ok(())
            },
        ))?;
        session.StartCapture()?;

        let arrived = rx.recv_timeout(FRAME_TIMEOUT);
        let frame = arrived
            .map_err(|_| anyhow!("no frame within {:?}", FRAME_TIMEOUT))
            .and_then(|_| pool.TryGetNextFrame().context("frame pool returned no frame"));

        let _ = session.Close();
        let _ = pool.Close();
        frame
    }

    /// Copies a GPU texture to CPU memory and crops it to the client area.
    fn read_texture(&self, texture: &ID3D11Texture2D, crop: ClientCrop) -> Result<RgbaImage> {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };

        let staging_desc = D3D11_TEXTURE2D_DESC {
            MipLevels: 1,
            ArraySize: 1,
            Usage: D3D11_USAGE_STAGING,
            BindFlags: Default::default(),
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            MiscFlags: Default::default(),
            ..desc
        };
        let mut staging: Option<ID3D11Texture2D> = None;
        unsafe { self.device.CreateTexture2D(&staging_desc, None, Some(&mut staging))? };
        let staging: ID3D11Resource = staging
            .ok_or_else(|| anyhow!("no staging texture returned"))?
            .cast()?;

        unsafe {
            self.context.CopyResource(&staging, &texture.cast::<ID3D11Resource>()?);
        }

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { self.context.Map(&staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped))? };
        let bytes = unsafe {
            std::slice::from_raw_parts(
                mapped.pData as *const u8,
                (mapped.RowPitch * desc.Height) as usize,
            )
        };
        let img = bgra_to_rgba(
            bytes,
            mapped.RowPitch as usize,
            (desc.Width, desc.Height),
            crop,
        );
        unsafe { self.context.Unmap(&staging, 0) };

        Ok(img)
    }
}

fn capture_item_for(hwnd: HWND) -> Result<GraphicsCaptureItem> {
    let interop: IGraphicsCaptureItemInterop = unsafe {
        RoGetActivationFactory(windows::core::h!(
            "Windows.Graphics.Capture.GraphicsCaptureItem"
        ))
        .context("Graphics Capture is not available")?
    };
    unsafe { interop.CreateForWindow(hwnd) }.context("window cannot be captured")
}

/// Captures the client area of `hwnd` (title bar and borders removed).
pub fn capture_client_area(hwnd: HWND) -> Result<RgbaImage> {
    let (client, offset) = get_client_area_info(hwnd)?;
    let width = client.right - client.left;
    let height = client.bottom - client.top;
    if width <= 0 || height <= 0 {
        return Err(anyhow!("game window has no client area (minimized?)"));
    }
    let crop = ClientCrop {
        x: offset.x.max(0) as u32,
        y: offset.y.max(0) as u32,
        width: width as u32,
        height: height as u32,
    };

    let device = CaptureDevice::create()?;
    let frame = device.next_frame(&capture_item_for(hwnd)?)?;
    let access: IDirect3DDxgiInterfaceAccess = frame.Surface()?.cast()?;
    let texture: ID3D11Texture2D = unsafe { access.GetInterface()? };

    let img = device.read_texture(&texture, crop)?;
    log::debug!(
        "Captured {}x{} client area at offset ({}, {})",
        img.width(),
        img.height(),
        crop.x,
        crop.y
    );
    Ok(img)
}
