// Reading the brand tables from an Excel workbook.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use std::path::Path;

use pairwise_engine::{AssetRow, MetricRow};

use crate::survey::io_common::*;
use crate::survey::*;

/// Reads the price rows and the image rows of the brand workbook.
pub fn read_brand_rows(
    root: &Path,
    source: &BrandSource,
) -> SurveyResult<(Vec<MetricRow>, Vec<AssetRow>)> {
    let path = resolve_path(root, &source.file_path).display().to_string();
    info!("Attempting to read brand file {:?}", path);
    let mut workbook: Xlsx<_> =
        open_workbook(&path).context(OpeningExcelSnafu { path: path.clone() })?;
    let prices = get_range(&mut workbook, source.prices_worksheet(), &path)?;
    let images = get_range(&mut workbook, source.images_worksheet(), &path)?;
    let metrics = read_price_rows(&prices, source, &path)?;
    let assets = read_image_rows(&images, source, &path)?;
    info!(
        "read_brand_rows: {} price rows, {} image rows",
        metrics.len(),
        assets.len()
    );
    Ok((metrics, assets))
}

fn get_range<RS: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<RS>,
    name: &str,
    path: &str,
) -> SurveyResult<Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, name);
    workbook
        .worksheet_range(name)
        .context(MissingWorksheetSnafu { name, path })?
        .context(OpeningExcelSnafu { path })
}

fn header_of(range: &Range<DataType>, worksheet: &str) -> SurveyResult<Vec<Option<String>>> {
    let header = range.rows().next().context(EmptyExcelSnafu { name: worksheet })?;
    debug!("header: {:?}", header);
    Ok(header.iter().map(|c| read_cell_string(Some(c))).collect())
}

/// One row per brand name, with the price when it reads as a number.
pub fn read_price_rows(
    range: &Range<DataType>,
    source: &BrandSource,
    path: &str,
) -> SurveyResult<Vec<MetricRow>> {
    let header = header_of(range, source.prices_worksheet())?;
    let cols = get_col_index_mapping(&[source.name_col(), source.price_col()], &header, path)?;
    let (name_idx, price_idx) = (cols[0], cols[1]);

    let mut res: Vec<MetricRow> = Vec::new();
    for (idx, row) in range.rows().skip(1).enumerate() {
        let name = match read_cell_string(row.get(name_idx)) {
            Some(n) => n,
            None => {
                debug!("read_price_rows: row {}: no brand name", idx + 2);
                continue;
            }
        };
        res.push(MetricRow {
            name,
            metric: read_cell_number(row.get(price_idx)),
            category: None,
        });
    }
    Ok(res)
}

/// One row per image, with the sub-category used for weighting.
pub fn read_image_rows(
    range: &Range<DataType>,
    source: &BrandSource,
    path: &str,
) -> SurveyResult<Vec<AssetRow>> {
    let header = header_of(range, source.images_worksheet())?;
    let cols = get_col_index_mapping(
        &[
            source.name_col(),
            source.image_col(),
            source.sub_category_col(),
        ],
        &header,
        path,
    )?;
    let (name_idx, image_idx, sub_idx) = (cols[0], cols[1], cols[2]);

    let mut res: Vec<AssetRow> = Vec::new();
    for row in range.rows().skip(1) {
        if let Some(name) = read_cell_string(row.get(name_idx)) {
            res.push(AssetRow {
                name,
                resource: read_cell_string(row.get(image_idx)),
                sub_category: read_cell_string(row.get(sub_idx)),
                caption: None,
            });
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> BrandSource {
        BrandSource {
            file_path: "brands.xlsx".to_string(),
            prices_worksheet_name: None,
            images_worksheet_name: None,
            name_column: None,
            price_column: None,
            image_column: None,
            sub_category_column: None,
        }
    }

    fn range(rows: Vec<Vec<DataType>>) -> Range<DataType> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut r = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, cell) in row.into_iter().enumerate() {
                r.set_value((i as u32, j as u32), cell);
            }
        }
        r
    }

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    #[test]
    fn prices() {
        let r = range(vec![
            vec![s("Brand"), s("Average Price")],
            vec![s("Gucci"), DataType::Float(950.0)],
            vec![s("Vince"), s("310")],
            vec![s("Nike"), s("unknown")],
            vec![DataType::Empty, DataType::Int(4)],
        ]);
        let rows = read_price_rows(&r, &source(), "brands.xlsx").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].metric, Some(950.0));
        assert_eq!(rows[1].metric, Some(310.0));
        assert_eq!(rows[2].name, "Nike");
        assert_eq!(rows[2].metric, None);
    }

    #[test]
    fn images() {
        let r = range(vec![
            vec![s("Category 2"), s("Brand"), s("Product image URL")],
            vec![s("bags"), s("GUCCI"), s("'https://x/1.jpg'")],
            vec![DataType::Empty, s("GUCCI"), s("https://x/2.jpg")],
            vec![s("shoes"), s("NIKE"), DataType::Empty],
        ]);
        let rows = read_image_rows(&r, &source(), "brands.xlsx").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].sub_category.as_deref(), Some("bags"));
        assert_eq!(rows[1].sub_category, None);
        assert_eq!(rows[2].resource, None);
    }

    #[test]
    fn missing_price_column() {
        let r = range(vec![vec![s("Brand"), s("Price")], vec![s("Gucci"), DataType::Int(1)]]);
        match read_price_rows(&r, &source(), "brands.xlsx") {
            Err(SurveyError::MissingColumn { column, .. }) => assert_eq!(column, "Average Price"),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_brand_rows(dir.path(), &source()).is_err());
    }
}
