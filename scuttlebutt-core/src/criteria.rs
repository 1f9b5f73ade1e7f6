//! Philip Fisher's 15-point investment criteria from
//! "Common Stocks and Uncommon Profits".

use serde::Serialize;

/// Whether a criterion can be assessed from financials or needs scuttlebutt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionCategory {
    Quantitative,
    Qualitative,
}

/// One of the fifteen fixed evaluation dimensions.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Criterion {
    pub id: i64,
    pub title: &'static str,
    pub description: &'static str,
    pub category: CriterionCategory,
}

/// Lowest valid rating.
pub const MIN_RATING: i64 = 1;
/// Highest valid rating.
pub const MAX_RATING: i64 = 5;

pub const FISHER_CRITERIA: [Criterion; 15] = [
    Criterion {
        id: 1,
        title: "Products/Services with Market Potential",
        description: "Does the company have products or services with sufficient market potential to make possible a sizable increase in sales for at least several years?",
        category: CriterionCategory::Quantitative,
    },
    Criterion {
        id: 2,
        title: "Management's Determination for Growth",
        description: "Does the management have a determination to continue to develop products or processes that will still further increase total sales potentials when the growth potentials of currently attractive product lines have largely been exploited?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 3,
        title: "R&D Effectiveness",
        description: "How effective are the company's research and development efforts in relation to its size?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 4,
        title: "Sales Organization",
        description: "Does the company have an above-average sales organization?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 5,
        title: "Profit Margin",
        description: "Does the company have a worthwhile profit margin?",
        category: CriterionCategory::Quantitative,
    },
    Criterion {
        id: 6,
        title: "Maintaining/Improving Profit Margins",
        description: "What is the company doing to maintain or improve profit margins?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 7,
        title: "Labor and Personnel Relations",
        description: "Does the company have outstanding labor and personnel relations?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 8,
        title: "Executive Relations",
        description: "Does the company have outstanding executive relations?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 9,
        title: "Management Depth",
        description: "Does the company have depth to its management?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 10,
        title: "Cost Analysis and Accounting Controls",
        description: "How good are the company's cost analysis and accounting controls?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 11,
        title: "Industry-Specific Competitive Advantages",
        description: "Are there other aspects of the business, somewhat peculiar to the industry involved, which will give the investor important clues as to how outstanding the company may be in relation to its competition?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 12,
        title: "Long-Range Profit Outlook",
        description: "Does the company have a short-range or long-range outlook in regard to profits?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 13,
        title: "Future Equity Financing",
        description: "In the foreseeable future will the growth of the company require sufficient equity financing so that the larger number of shares then outstanding will largely cancel the existing stockholders' benefit from this anticipated growth?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 14,
        title: "Management Communication",
        description: "Does the management talk freely to investors about its affairs when things are going well but 'clam up' when troubles and disappointments occur?",
        category: CriterionCategory::Qualitative,
    },
    Criterion {
        id: 15,
        title: "Management Integrity",
        description: "Does the company have a management of unquestionable integrity?",
        category: CriterionCategory::Qualitative,
    },
];

/// Look up a criterion by id.
pub fn criterion(id: i64) -> Option<&'static Criterion> {
    FISHER_CRITERIA.iter().find(|c| c.id == id)
}

/// Human label for a (possibly fractional) rating.
pub fn rating_label(rating: f64) -> &'static str {
    if rating >= 4.5 {
        "Excellent"
    } else if rating >= 4.0 {
        "Good"
    } else if rating >= 3.0 {
        "Average"
    } else if rating >= 2.0 {
        "Below Average"
    } else {
        "Poor"
    }
}
