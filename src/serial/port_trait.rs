//! Trait abstraction for the link byte transport to enable testing

use async_trait::async_trait;
use std::io;
use tokio::time::Duration;

/// Byte transport the link driver runs over
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkTransport: Send {
    /// Read whatever bytes are available into `buf`
    ///
    /// Waits at most `wait` for data. Returns `Ok(0)` only when nothing
    /// arrived in time. End of stream is reported as
    /// [`io::ErrorKind::UnexpectedEof`].
    async fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<usize>;

    /// Write all data and flush it out
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted transport: hands out queued chunks, records writes
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        pub incoming: Arc<Mutex<VecDeque<Vec<u8>>>>,
        pub written_data: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue bytes split into chunks of `chunk_size`
        pub fn queue_chunked(&self, data: &[u8], chunk_size: usize) {
            let mut incoming = self.incoming.lock().unwrap();
            for chunk in data.chunks(chunk_size) {
                incoming.push_back(chunk.to_vec());
            }
        }

        pub fn queue(&self, data: &[u8]) {
            self.incoming.lock().unwrap().push_back(data.to_vec());
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.written_data.lock().unwrap().clone()
        }

        pub fn pending(&self) -> usize {
            self.incoming.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LinkTransport for ScriptedTransport {
        async fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<usize> {
            let next = {
                let mut incoming = self.incoming.lock().unwrap();
                match incoming.pop_front() {
                    Some(mut chunk) if chunk.len() > buf.len() => {
                        let rest = chunk.split_off(buf.len());
                        incoming.push_front(rest);
                        Some(chunk)
                    }
                    other => other,
                }
            };

            match next {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => {
                    tokio::time::sleep(wait).await;
                    Ok(0)
                }
            }
        }

        async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            self.written_data.lock().unwrap().push(data.to_vec());
            Ok(())
        }
    }
}
