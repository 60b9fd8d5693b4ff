/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

pub use catalog_client::CatalogClient;
pub use in_app_listener::InAppListener;
pub use main_thread_poster::{MainThreadPoster, PostedTask};
pub use sse_transport::{Reconnect, SseTransport};
pub use surface_presenter::{InlineSurfaceView, SurfacePresenter};

mod catalog_client;
mod in_app_listener;
mod main_thread_poster;
mod sse_transport;
mod surface_presenter;
