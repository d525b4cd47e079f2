use std::sync::mpsc;

use image::RgbaImage;
use tracing::{debug, warn};

use putimage_core::{
    DirectoryLabel, EditedLayers, ImageRecord, LayerKind, LayerStore, ReloadTicket, StoreError,
};
use putimage_editor::{
    codec, resolve_output, EditorError, FsLayerStore, LayerRequest, LoadTicket, SaveRequest,
};

/// Request sent from the UI thread to the I/O worker. `node` routes the
/// response back to the node that asked.
pub(crate) enum IoRequest {
    List {
        node: u32,
        ticket: ReloadTicket,
        dir: String,
    },
    /// Fetch and decode one layer raster.
    Fetch { node: u32, request: LayerRequest },
    Save { node: u32, request: SaveRequest },
    Clear { node: u32, original_path: String },
    SendTo { path: String, label: DirectoryLabel },
    /// Resolve what a generation cycle receives from a node.
    Output { node: u32, record: ImageRecord },
}

/// Response sent from the I/O worker back to the UI thread.
pub(crate) enum IoResponse {
    Listing {
        node: u32,
        ticket: ReloadTicket,
        result: Result<Vec<ImageRecord>, StoreError>,
    },
    Layer {
        node: u32,
        ticket: LoadTicket,
        kind: LayerKind,
        decoded: Result<RgbaImage, EditorError>,
    },
    Saved {
        node: u32,
        original_path: String,
        result: Result<EditedLayers, StoreError>,
    },
    Cleared {
        node: u32,
        original_path: String,
        result: Result<(), StoreError>,
    },
    Sent {
        path: String,
        label: DirectoryLabel,
        result: Result<(), StoreError>,
    },
    Output {
        node: u32,
        summary: Result<String, EditorError>,
    },
}

/// Spawn a dedicated I/O worker thread serving requests against `store`.
///
/// Returns the send-side for requests and the receive-side for responses.
/// The thread runs until the request sender is dropped. `wake` is called
/// after every response so the UI repaints.
pub(crate) fn spawn_io_worker(
    store: FsLayerStore,
    wake: impl Fn() + Send + 'static,
) -> std::io::Result<(mpsc::Sender<IoRequest>, mpsc::Receiver<IoResponse>)> {
    let (req_tx, req_rx) = mpsc::channel::<IoRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<IoResponse>();

    std::thread::Builder::new()
        .name("io-worker".into())
        .spawn(move || {
            debug!("IO worker thread started");
            while let Ok(request) = req_rx.recv() {
                let response = serve(&store, request);
                if resp_tx.send(response).is_err() {
                    break;
                }
                wake();
            }
            debug!("IO worker thread exiting");
        })?;

    Ok((req_tx, resp_rx))
}

fn serve(store: &FsLayerStore, request: IoRequest) -> IoResponse {
    match request {
        IoRequest::List { node, ticket, dir } => IoResponse::Listing {
            node,
            ticket,
            result: store.list_images(&dir),
        },
        IoRequest::Fetch { node, request } => {
            let decoded = store
                .fetch_raster(&request.path, request.cache_token)
                .map_err(EditorError::from)
                .and_then(|bytes| codec::decode_raster(&bytes));
            if let Err(e) = &decoded {
                warn!("IO worker: {} layer {:?}: {e}", request.kind.label(), request.path);
            }
            IoResponse::Layer {
                node,
                ticket: request.ticket,
                kind: request.kind,
                decoded,
            }
        }
        IoRequest::Save { node, request } => IoResponse::Saved {
            node,
            result: store.save_edited_layers(
                &request.original_path,
                &request.draw,
                &request.mask,
            ),
            original_path: request.original_path,
        },
        IoRequest::Clear {
            node,
            original_path,
        } => IoResponse::Cleared {
            node,
            result: store.clear_edited_layers(&original_path),
            original_path,
        },
        IoRequest::SendTo { path, label } => IoResponse::Sent {
            result: store.send_to_dir(&path, label),
            path,
            label,
        },
        IoRequest::Output { node, record } => IoResponse::Output {
            node,
            summary: resolve_output(&record).map(|out| {
                let masked = out.mask.pixels().filter(|p| p[0] > 0).count();
                format!(
                    "{} ({}x{}, {masked} masked px)",
                    out.filename,
                    out.image.width(),
                    out.image.height()
                )
            }),
        },
    }
}
