// DIAGNOSTIC STUB ONLY (not part of the repo)
pub unsafe fn ioctl<T>(_fd: i32, _req: u64, _v: T) -> i32 { -1 }
#[macro_export] macro_rules! iow { ($a:expr,$b:expr,$c:expr) => (0u64) }
#[macro_export] macro_rules! ioctl {
  (none $name:ident with $a:expr, $b:expr) => (pub unsafe fn $name(_fd: i32) -> i32 { -1 });
  (read $name:ident with $a:expr, $b:expr; $ty:ty) => (pub unsafe fn $name(_fd: i32, _v: *mut $ty) -> i32 { -1 });
}
