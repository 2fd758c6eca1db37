//! Page fixtures and an in-memory fetcher for extractor tests.

use crate::core::{FetchError, PageFetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves fixed pages by URL and counts every request.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FixtureFetcher {
    pub fn with_page(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Detail page in the layout of the fund site.
pub struct DetailPage {
    pub name: &'static str,
    pub fund_type: &'static str,
    pub scale: &'static str,
    pub closed_period: Option<&'static str>,
    pub with_info_panel: bool,
    pub trade_items: usize,
    pub status: &'static str,
    pub reopen_window: Option<&'static str>,
    pub compare_price: Option<&'static str>,
    pub now_price: Option<&'static str>,
    pub manager: &'static str,
    pub tenure: &'static str,
}

impl Default for DetailPage {
    fn default() -> Self {
        DetailPage {
            name: "华夏成长混合(000001)",
            fund_type: "混合型-偏股",
            scale: "规模：27.30亿元（2024-03-31）",
            closed_period: None,
            with_info_panel: true,
            trade_items: 5,
            status: "开放申购",
            reopen_window: None,
            compare_price: Some("1.50%"),
            now_price: Some("0.15%"),
            manager: "王泽实 万方方",
            tenure: "2020-01-01~至今",
        }
    }
}

impl DetailPage {
    pub fn render(&self) -> String {
        let (code_open, rest) = self.name.split_once('(').unwrap_or((self.name, ""));
        let title = if rest.is_empty() {
            format!(r#"<div style="float: left">{code_open}</div>"#)
        } else {
            format!(
                r#"<div style="float: left">{code_open}<span>(</span><span class="ui-num">{}</span></div>"#,
                rest
            )
        };

        let info_panel = if self.with_info_panel {
            let closed = self
                .closed_period
                .map(|c| format!("<td>{c}</td>"))
                .unwrap_or_default();
            format!(
                r##"<div class="infoOfFund"><table>
                  <tr><td style="width:35%">类型：<a href="#">{}</a>&nbsp;&nbsp;|&nbsp;&nbsp;中高风险</td>
                      <td style="width:30%"><a href="#">规模</a>{}</td>
                      <td>基金经理：<a href="#">王泽实</a>等</td></tr>
                  <tr><td><span class="letterSpace01">成 立 日</span>：2001-12-18</td>
                      <td>管 理 人：<a href="#">华夏基金</a></td>{closed}</tr>
                </table></div>"##,
                self.fund_type,
                self.scale.trim_start_matches("规模"),
            )
        } else {
            String::new()
        };

        let reopen = self
            .reopen_window
            .map(|w| format!(r#"<span class="ui-color-red planData kfadate">{w}</span>"#))
            .unwrap_or_default();
        let compare = self
            .compare_price
            .map(|p| format!(r#"<span class="comparePrice">{p}</span>"#))
            .unwrap_or_default();
        let now = self
            .now_price
            .map(|p| format!(r#"<span class="nowPrice">{p}</span>"#))
            .unwrap_or_default();
        let items = [
            format!(
                r#"<div class="staticItem"><span class="itemTit">交易状态：</span><span class="staticCell">{}</span></div>"#,
                self.status
            ),
            r#"<div class="staticItem"><span class="itemTit">购买起点：</span>10元</div>"#.to_string(),
            format!(r#"<div class="staticItem"><span class="itemTit">开放时间：</span>{reopen}</div>"#),
            r#"<div class="staticItem"><span class="itemTit">赎回到账：</span>T+3</div>"#.to_string(),
            format!(
                r#"<div class="staticItem"><span class="itemTit">购买手续费：</span>{compare}{now}</div>"#
            ),
        ];
        let trade_items: String = items.iter().take(self.trade_items).cloned().collect();

        format!(
            r#"<!DOCTYPE html>
            <html><head><meta charset="utf-8"><title>{name}</title></head>
            <body>
              <div class="fundDetail-tit">{title}</div>
              <div class="fundDetail-main">
                {info_panel}
                <div class="buyWayStatic">{trade_items}</div>
              </div>
              <ul>
                <li class="fundManagerTab">
                  <table>
                    <tr><th class="first">任职时间</th><th>基金经理</th><th>任职天数</th><th>任职回报</th></tr>
                    <tr><td class="first">{tenure}</td><td>{manager}</td><td>4年又120天</td><td>12.34%</td></tr>
                    <tr><td class="first">2015-03-01~2020-01-01</td><td>前任经理</td><td>4年又306天</td><td>30.01%</td></tr>
                  </table>
                </li>
              </ul>
            </body></html>"#,
            name = self.name,
            tenure = self.tenure,
            manager = self.manager,
        )
    }
}

/// Fee page with a subscription schedule followed by the redemption schedule.
pub struct FeePage {
    pub subscription: Vec<(&'static str, &'static str, &'static str)>,
    pub redemption: Vec<(&'static str, &'static str, &'static str)>,
}

impl Default for FeePage {
    fn default() -> Self {
        FeePage {
            subscription: vec![
                ("小于100万元", "---", "1.50%"),
                ("大于等于100万元，小于500万元", "---", "1.20%"),
            ],
            redemption: vec![
                ("---", "小于7天", "1.50%"),
                ("---", "大于等于7天，小于1年", "0.50%"),
                ("---", "大于等于1年，小于2年", "0.25%"),
                ("---", "大于等于2年", "0.00%"),
            ],
        }
    }
}

impl FeePage {
    fn table(header: [&str; 3], rows: &[(&str, &str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(a, b, c)| format!("<tr><td>{a}</td><td>{b}</td><td>{c}</td></tr>"))
            .collect();
        format!(
            r#"<table class="w650 comm jjfl"><thead><tr><th>{}</th><th>{}</th><th>{}</th></tr></thead><tbody>{body}</tbody></table>"#,
            header[0], header[1], header[2]
        )
    }

    pub fn render(&self) -> String {
        format!(
            r#"<html><body>
              <div class="boxitem"><h4>申购费率</h4>{}</div>
              <div class="boxitem"><h4>赎回费率</h4>{}</div>
            </body></html>"#,
            Self::table(["适用金额", "适用期限", "原费率"], &self.subscription),
            Self::table(["适用金额", "适用期限", "赎回费率"], &self.redemption),
        )
    }
}
