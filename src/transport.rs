//! The transport endpoint: a bound `AF_QIPCRTR` datagram socket. The
//! kernel does not expose this address family through `std::net`, so the
//! socket is opened and driven directly through `libc`, the same way a
//! userspace QRTR client talks to the fabric.

use std::io;
use std::mem::{size_of, MaybeUninit};
use std::os::unix::io::{AsRawFd, RawFd};

use registry::addr::{QrtrAddr, BROADCAST_NODE, CTRL_PORT};

/// `AF_QIPCRTR`, not present in `libc` — the fabric's address family
/// number as defined by the kernel's `linux/qrtr.h`.
const AF_QIPCRTR: i32 = 42;

#[repr(C)]
#[derive(Clone, Copy)]
struct SockaddrQrtr {
    sq_family: libc::sa_family_t,
    sq_node: u32,
    sq_port: u32,
}

fn bcast_sockaddr() -> SockaddrQrtr {
    SockaddrQrtr {
        sq_family: AF_QIPCRTR as libc::sa_family_t,
        sq_node: BROADCAST_NODE,
        sq_port: CTRL_PORT,
    }
}

fn sockaddr_of(addr: QrtrAddr) -> SockaddrQrtr {
    SockaddrQrtr {
        sq_family: AF_QIPCRTR as libc::sa_family_t,
        sq_node: addr.node,
        sq_port: addr.port,
    }
}

/// A single bound `AF_QIPCRTR` datagram socket, owned for the daemon's
/// lifetime. `Drop` closes the underlying file descriptor.
pub struct Endpoint {
    fd: RawFd,
}

impl Endpoint {
    /// Opens a datagram socket and binds it to `(local_node, port)`.
    /// Passing `port = 0` lets the kernel assign an ephemeral port and is
    /// not used by this daemon, which always binds a well-known port.
    pub fn bind(port: u32) -> io::Result<Self> {
        let fd = unsafe { libc::socket(AF_QIPCRTR, libc::SOCK_DGRAM, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let sa = SockaddrQrtr { sq_family: AF_QIPCRTR as libc::sa_family_t, sq_node: 0, sq_port: port };
        let rc = unsafe {
            libc::bind(
                fd,
                &sa as *const SockaddrQrtr as *const libc::sockaddr,
                size_of::<SockaddrQrtr>() as libc::socklen_t,
            )
        };

        if rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        Ok(Self { fd })
    }

    /// The node-id the kernel assigned this socket on bind, queried once
    /// and treated as fixed for the process lifetime (§3 "Local node").
    pub fn local_node(&self) -> io::Result<u32> {
        let mut sa = MaybeUninit::<SockaddrQrtr>::zeroed();
        let mut len = size_of::<SockaddrQrtr>() as libc::socklen_t;

        let rc = unsafe { libc::getsockname(self.fd, sa.as_mut_ptr() as *mut libc::sockaddr, &mut len) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(unsafe { sa.assume_init() }.sq_node)
    }

    /// Sends `bytes` to `dest`. A send failure is logged by the caller
    /// and never treated as fatal (§7 `TransportError`).
    pub fn send(&self, dest: QrtrAddr, bytes: &[u8]) -> io::Result<usize> {
        let sa = sockaddr_of(dest);
        let rc = unsafe {
            libc::sendto(
                self.fd,
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
                0,
                &sa as *const SockaddrQrtr as *const libc::sockaddr,
                size_of::<SockaddrQrtr>() as libc::socklen_t,
            )
        };

        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(rc as usize)
        }
    }

    /// Sends `bytes` to every peer's control port.
    pub fn broadcast_ctrl(&self, bytes: &[u8]) -> io::Result<usize> {
        let sa = bcast_sockaddr();
        let rc = unsafe {
            libc::sendto(
                self.fd,
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
                0,
                &sa as *const SockaddrQrtr as *const libc::sockaddr,
                size_of::<SockaddrQrtr>() as libc::socklen_t,
            )
        };

        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(rc as usize)
        }
    }

    /// Receives one datagram, returning its source address alongside the
    /// bytes. A recv failure is fatal (§7): the caller closes the socket
    /// and stops the event loop.
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<(QrtrAddr, usize)> {
        let mut sa = MaybeUninit::<SockaddrQrtr>::zeroed();
        let mut len = size_of::<SockaddrQrtr>() as libc::socklen_t;

        let rc = unsafe {
            libc::recvfrom(
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
                sa.as_mut_ptr() as *mut libc::sockaddr,
                &mut len,
            )
        };

        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        let sa = unsafe { sa.assume_init() };
        Ok((QrtrAddr::new(sa.sq_node, sa.sq_port), rc as usize))
    }
}

impl AsRawFd for Endpoint {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
