//! Device stream abstraction for serial ports and TCP bridges.

use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_serial::SerialStream;

pin_project! {
    /// A stream to the peripheral: a local serial port or a TCP serial bridge.
    #[project = DeviceStreamProj]
    pub enum DeviceStream {
        Serial { #[pin] stream: SerialStream },
        Tcp { #[pin] stream: TcpStream },
    }
}

impl AsyncRead for DeviceStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            DeviceStreamProj::Serial { stream } => stream.poll_read(cx, buf),
            DeviceStreamProj::Tcp { stream } => stream.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for DeviceStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            DeviceStreamProj::Serial { stream } => stream.poll_write(cx, buf),
            DeviceStreamProj::Tcp { stream } => stream.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            DeviceStreamProj::Serial { stream } => stream.poll_flush(cx),
            DeviceStreamProj::Tcp { stream } => stream.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            DeviceStreamProj::Serial { stream } => stream.poll_shutdown(cx),
            DeviceStreamProj::Tcp { stream } => stream.poll_shutdown(cx),
        }
    }
}
