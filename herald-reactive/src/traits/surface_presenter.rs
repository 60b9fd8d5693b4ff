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

use herald_core::prelude::{Message, MessagePosition};

/// Opens and closes the modal surface.
pub trait SurfacePresenter: Send + Sync + 'static {
    /// Opens a modal surface showing `message` at `position`.
    fn present_modal(&self, message: &Message, position: MessagePosition);

    /// Closes the modal surface, if one is open.
    fn teardown_modal(&self);
}

/// The host view behind one inline element.
pub trait InlineSurfaceView: Send + Sync + 'static {
    /// Shows `message` in the element.
    fn embed(&self, message: &Message);

    /// Removes whatever the element shows.
    fn clear(&self);
}
