use std::io;

/// Opens download links produced by explorer responses.
pub trait DownloadOpener: Send {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens links in the system browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserOpener;

impl DownloadOpener for BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        webbrowser::open(url)
    }
}
