use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use clap::Parser;
use log::{debug, info, warn};
use taufs::{Disk, FileService, FileSystem, Method, Request};

/// Serve a disk image over HTTP.
///
/// GET reads files and lists directories, PUT creates or overwrites
/// (trailing slash means directory), DELETE unlinks. The filesystem is
/// single-threaded, so every request goes through one mutex.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Path prefix the service is mounted under
    #[arg(long, default_value = "/ds3/")]
    prefix: String,

    /// Worker threads accepting requests
    #[arg(long, default_value_t = 4)]
    threads: usize,
}

fn serve(server: &tiny_http::Server, service: &Mutex<FileService>) {
    for mut request in server.incoming_requests() {
        let method = match request.method() {
            tiny_http::Method::Get => Method::Get,
            tiny_http::Method::Put => Method::Put,
            tiny_http::Method::Delete => Method::Delete,
            other => {
                debug!("unsupported method {other}");
                let _ = request.respond(tiny_http::Response::empty(400));
                continue;
            }
        };

        let mut body = Vec::new();
        if request.as_reader().read_to_end(&mut body).is_err() {
            let _ = request.respond(tiny_http::Response::empty(400));
            continue;
        }
        let req = Request {
            method,
            path: request.url().to_string(),
            body,
        };

        let resp = service.lock().unwrap().handle(&req);
        debug!("{method:?} {} -> {}", req.path, resp.status);
        let mut http_resp =
            tiny_http::Response::from_data(resp.body).with_status_code(resp.status);
        if let Some(content_type) = resp.content_type {
            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                    .expect("static header");
            http_resp = http_resp.with_header(header);
        }
        if let Err(e) = request.respond(http_resp) {
            warn!("failed to send response: {e}");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let cli = Cli::parse();

    let fs = FileSystem::open(Disk::open(&cli.image)?)?;
    let service = Arc::new(Mutex::new(FileService::new(fs, cli.prefix.clone())));
    let server = Arc::new(tiny_http::Server::http(cli.listen.as_str())?);
    info!(
        "serving {} under {} on {}",
        cli.image.display(),
        cli.prefix,
        cli.listen
    );

    let mut workers = Vec::new();
    for _ in 0..cli.threads.max(1) {
        let server = Arc::clone(&server);
        let service = Arc::clone(&service);
        workers.push(thread::spawn(move || serve(&server, &service)));
    }
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    Ok(())
}
