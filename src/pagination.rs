// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pagination over partial result sets.

use std::future::Future;

#[cfg(feature = "stream")]
use async_stream::try_stream;
#[cfg(feature = "stream")]
use futures::stream::Stream;
use http::header::{HeaderMap, CONTENT_RANGE};
use log::{debug, trace};

use super::Error;

/// The largest page size the array serves.
///
/// List calls that drain a paginated collection request this many rows per
/// page.
pub const DEFAULT_PAGE_LIMIT: u32 = 1000;

/// Pagination state of one response.
///
/// Parsed from the `Content-Range` header, which has the form
/// `first-last/total` (e.g. `0-99/350`) when the array returns a partial
/// result set. An absent or malformed header means the response is complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// Index of the first returned row.
    pub first: u32,
    /// Index of the last returned row.
    pub last: u32,
    /// Total number of rows in the collection.
    pub total: u32,
    /// Whether the response is a partial result set.
    pub is_paginated: bool,
}

impl ResponseMetadata {
    /// Parse a `first-last/total` range value.
    ///
    /// Malformed content degrades to "not paginated" rather than failing.
    pub fn from_content_range(value: &str) -> ResponseMetadata {
        fn parse(value: &str) -> Option<(u32, u32, u32)> {
            let (range, total) = value.rsplit_once('/')?;
            let (first, last) = range.split_once('-')?;
            Some((
                first.trim().parse().ok()?,
                last.trim().parse().ok()?,
                total.trim().parse().ok()?,
            ))
        }

        match parse(value) {
            Some((first, last, total)) => ResponseMetadata {
                first,
                last,
                total,
                is_paginated: true,
            },
            None => {
                trace!("Ignoring malformed Content-Range value {:?}", value);
                ResponseMetadata::default()
            }
        }
    }

    pub(crate) fn from_headers(headers: &HeaderMap) -> ResponseMetadata {
        headers
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .map(ResponseMetadata::from_content_range)
            .unwrap_or_default()
    }

    /// Offset of the first row past this page.
    #[inline]
    pub fn next_offset(&self) -> u32 {
        self.last.saturating_add(1)
    }
}

/// Drain a paginated collection.
///
/// Calls `fetch_page(0)` first and, only if the reported metadata indicates
/// pagination, keeps calling `fetch_page(previous_last + 1)` until the total
/// is reached. Page fetches are strictly sequential. The closure is expected
/// to accumulate rows into caller-owned storage as a side effect:
///
/// ```rust,no_run
/// # async fn example(client: powerstore::Client) -> Result<(), powerstore::Error> {
/// use std::cell::RefCell;
///
/// let names = RefCell::new(Vec::<String>::new());
/// powerstore::paginate(|offset| {
///     let names = &names;
///     let client = &client;
///     async move {
///         let (page, meta) = client.volume_page(offset).await?;
///         names.borrow_mut().extend(page.into_iter().map(|v| v.name));
///         Ok(meta)
///     }
/// })
/// .await?;
/// # Ok(()) }
/// ```
///
/// A continuation fetch failing with a bad-range error means the collection
/// shrank underneath us (a benign race against concurrent deletions); the
/// drain stops cleanly and reports success, keeping whatever the caller
/// accumulated so far. Any other continuation error, and any error from the
/// first page, aborts.
pub async fn paginate<F, Fut>(mut fetch_page: F) -> Result<(), Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ResponseMetadata, Error>>,
{
    let mut meta = fetch_page(0).await?;
    while meta.is_paginated && meta.next_offset() < meta.total {
        match fetch_page(meta.next_offset()).await {
            Ok(next) => meta = next,
            Err(err) if err.is_bad_range() => {
                debug!(
                    "Collection shrank while paginating (at offset {}), stopping: {}",
                    meta.next_offset(),
                    err
                );
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Adapt a page fetch into a stream of rows.
///
/// The page fetch receives an offset and resolves to the rows of that page
/// together with the response metadata. Requests happen lazily, one page at
/// a time, while the stream is polled. The benign bad-range stop condition
/// of [`paginate`] applies to continuation pages here as well.
#[cfg(feature = "stream")]
pub fn paginated<T, F, Fut>(mut fetch_page: F) -> impl Stream<Item = Result<T, Error>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, ResponseMetadata), Error>>,
{
    try_stream! {
        let mut offset = 0;
        loop {
            let (items, meta) = match fetch_page(offset).await {
                Ok(page) => page,
                Err(err) if offset > 0 && err.is_bad_range() => {
                    debug!("Collection shrank while streaming pages, stopping: {}", err);
                    break;
                }
                Err(err) => Err(err)?,
            };
            for item in items {
                yield item;
            }
            if !meta.is_paginated || meta.next_offset() >= meta.total {
                break;
            }
            offset = meta.next_offset();
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use reqwest::StatusCode;

    use super::{paginate, ResponseMetadata};
    use crate::{Error, ErrorKind};

    fn page(first: u32, last: u32, total: u32) -> ResponseMetadata {
        ResponseMetadata {
            first,
            last,
            total,
            is_paginated: true,
        }
    }

    #[test]
    fn test_content_range_round_trip() {
        let meta = ResponseMetadata::from_content_range("5-19/42");
        assert_eq!(meta.first, 5);
        assert_eq!(meta.last, 19);
        assert_eq!(meta.total, 42);
        assert!(meta.is_paginated);
        assert_eq!(meta.next_offset(), 20);
    }

    #[test]
    fn test_malformed_content_range_degrades() {
        for value in ["garbage", "1-2", "4/5", "a-b/c", ""] {
            let meta = ResponseMetadata::from_content_range(value);
            assert!(!meta.is_paginated, "{:?} should not parse", value);
        }
    }

    #[tokio::test]
    async fn test_single_page_is_one_call() {
        let calls = RefCell::new(Vec::new());
        paginate(|offset| {
            calls.borrow_mut().push(offset);
            async { Ok(ResponseMetadata::default()) }
        })
        .await
        .unwrap();
        assert_eq!(*calls.borrow(), vec![0]);
    }

    #[tokio::test]
    async fn test_drains_until_total() {
        let calls = RefCell::new(Vec::new());
        paginate(|offset| {
            calls.borrow_mut().push(offset);
            let meta = match offset {
                0 => page(0, 3, 10),
                4 => page(4, 7, 10),
                8 => page(8, 9, 10),
                other => panic!("unexpected offset {}", other),
            };
            async move { Ok(meta) }
        })
        .await
        .unwrap();
        assert_eq!(*calls.borrow(), vec![0, 4, 8]);
    }

    #[tokio::test]
    async fn test_bad_range_on_continuation_is_benign() {
        let calls = RefCell::new(Vec::new());
        let result = paginate(|offset| {
            calls.borrow_mut().push(offset);
            async move {
                if offset == 0 {
                    Ok(page(0, 3, 10))
                } else {
                    Err(Error::from_array_response(
                        StatusCode::RANGE_NOT_SATISFIABLE,
                        "",
                    ))
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(*calls.borrow(), vec![0, 4]);
    }

    #[tokio::test]
    async fn test_other_continuation_errors_abort() {
        let result = paginate(|offset| async move {
            if offset == 0 {
                Ok(page(0, 3, 10))
            } else {
                Err(Error::from_array_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "",
                ))
            }
        })
        .await;
        assert_eq!(result.err().unwrap().kind(), ErrorKind::ServerError);
    }

    #[tokio::test]
    async fn test_first_page_error_always_aborts() {
        let result = paginate(|_| async {
            Err::<ResponseMetadata, _>(Error::from_array_response(
                StatusCode::RANGE_NOT_SATISFIABLE,
                "",
            ))
        })
        .await;
        assert!(result.err().unwrap().is_bad_range());
    }

    #[cfg(feature = "stream")]
    #[tokio::test]
    async fn test_paginated_stream_yields_all_rows() {
        use futures::pin_mut;
        use futures::stream::TryStreamExt;

        let stream = super::paginated(|offset| async move {
            match offset {
                0 => Ok((vec![0u32, 1, 2, 3], page(0, 3, 6))),
                4 => Ok((vec![4, 5], page(4, 5, 6))),
                other => panic!("unexpected offset {}", other),
            }
        });
        pin_mut!(stream);

        let mut collected = Vec::new();
        while let Some(item) = stream.try_next().await.unwrap() {
            collected.push(item);
        }
        assert_eq!(collected, vec![0, 1, 2, 3, 4, 5]);
    }
}
